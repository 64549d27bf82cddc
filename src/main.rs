fn main() {
    if let Err(err) = customer_delta::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
