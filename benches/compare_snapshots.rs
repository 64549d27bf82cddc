use criterion::{Criterion, criterion_group, criterion_main};
use customer_delta::{export::to_csv, loader, matcher::compare};

fn generate_snapshot(rows: usize, offset: usize) -> String {
    let mut csv = String::from("customer_id,email,氏名,会社名,電話\n");
    for i in offset..offset + rows {
        csv.push_str(&format!(
            "{i},user{i}@example.com,顧客{i},会社{},03-{:04}-{:04}\n",
            i % 97,
            i % 10_000,
            (i * 7) % 10_000
        ));
    }
    csv
}

fn bench_compare(c: &mut Criterion) {
    let old_csv = generate_snapshot(50_000, 0);
    let new_csv = generate_snapshot(50_000, 5_000);

    c.bench_function("load_utf8_50k", |b| {
        b.iter(|| loader::load(old_csv.as_bytes(), "old.csv").expect("load old"))
    });

    let old = loader::load(old_csv.as_bytes(), "old.csv").expect("load old");
    let new = loader::load(new_csv.as_bytes(), "new.csv").expect("load new");

    c.bench_function("compare_50k_vs_50k", |b| b.iter(|| compare(&old, &new)));

    let result = compare(&old, &new);
    c.bench_function("export_5k_added", |b| {
        b.iter(|| to_csv(&result).expect("export"))
    });
}

criterion_group!(benches, bench_compare);
criterion_main!(benches);
