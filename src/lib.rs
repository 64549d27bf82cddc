pub mod cli;
pub mod diff;
pub mod encoding;
pub mod error;
pub mod export;
pub mod io_utils;
pub mod loader;
pub mod matcher;
pub mod record;
pub mod table;

use std::{env, io, path::Path, sync::OnceLock, thread};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, CompareArgs, ExportArgs, InspectArgs, OutputFormat, SnapshotArgs},
    diff::DiffResult,
    export::{DirectorySink, WriterSink},
    loader::SourceFormat,
    matcher::JoinKey,
    record::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("customer_delta", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => handle_compare(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Inspect(args) => handle_inspect(&args),
    }
}

fn handle_compare(args: &CompareArgs) -> Result<()> {
    let result = compare_snapshots(&args.snapshots)?;
    match args.format {
        OutputFormat::Json => {
            let json = result.to_json().context("Serializing comparison result")?;
            println!("{json}");
        }
        OutputFormat::Table => {
            if result.has_additions() {
                print!("{}", table::render_added(&result, args.limit));
            } else {
                println!("No new records found.");
            }
        }
    }
    Ok(())
}

fn handle_export(args: &ExportArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let result = compare_snapshots(&args.snapshots)?;
    let now = Utc::now();
    if io_utils::is_dash(&args.output) {
        let mut sink = WriterSink::new(io::stdout().lock());
        export::export_added(&result, &mut sink, encoding, now)?;
    } else {
        let mut sink = DirectorySink::new(&args.output);
        if export::export_added(&result, &mut sink, encoding, now)?.is_some() {
            for path in sink.written() {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn handle_inspect(args: &InspectArgs) -> Result<()> {
    let table = load_file(&args.input)?;
    println!("file: {}", table.source_name);
    println!("encoding: {}", table.encoding.unwrap_or("spreadsheet"));
    println!("rows: {}", table.len());
    println!("columns: {}", table.headers.join(", "));
    if !table.headers.is_empty() {
        println!();
        print!("{}", table::render_preview(&table, args.rows));
    }
    info!(
        "Displayed {} of {} row(s) from {:?}",
        table.len().min(args.rows),
        table.len(),
        args.input
    );
    Ok(())
}

/// Loads both snapshots and runs the matcher, honouring an explicit key.
pub fn compare_snapshots(args: &SnapshotArgs) -> Result<DiffResult> {
    info!(
        "Comparing '{}' (old) with '{}' (new)",
        args.old.display(),
        args.new.display()
    );
    let (old, new) = load_pair(&args.old, &args.new)?;
    let result = if args.key.is_empty() {
        matcher::compare(&old, &new)
    } else {
        let key = explicit_key(&args.key, &old, &new)?;
        matcher::compare_with_key(&old, &new, &key)
    };
    info!(
        "Join key {:?}: {} new record(s) out of {} in '{}'",
        result.join_key,
        result.summary.added_rows,
        new.len(),
        new.source_name
    );
    Ok(result)
}

/// Reads and loads one snapshot. The extension is checked before the file
/// is read.
pub fn load_file(path: &Path) -> Result<Table> {
    let file_name = io_utils::display_name(path);
    SourceFormat::from_file_name(&file_name)?;
    let bytes = io_utils::read_input(path)?;
    debug!("Read {} byte(s) from {:?}", bytes.len(), path);
    let table =
        loader::load(&bytes, &file_name).with_context(|| format!("Loading {path:?}"))?;
    Ok(table)
}

/// Loads the old and new snapshots concurrently; either failure aborts.
pub fn load_pair(old: &Path, new: &Path) -> Result<(Table, Table)> {
    thread::scope(|scope| -> Result<(Table, Table)> {
        let old_handle = scope.spawn(|| load_file(old));
        let new_table = load_file(new);
        let old_table = old_handle
            .join()
            .map_err(|_| anyhow!("Loading {old:?} panicked"))??;
        Ok((old_table, new_table?))
    })
}

fn explicit_key(columns: &[String], old: &Table, new: &Table) -> Result<JoinKey> {
    let columns = columns
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>();
    for column in &columns {
        if !old.has_column(column) || !new.has_column(column) {
            return Err(anyhow!(
                "Key column '{column}' must exist in both '{}' and '{}'",
                old.source_name,
                new.source_name
            ));
        }
    }
    Ok(JoinKey::new(columns))
}
