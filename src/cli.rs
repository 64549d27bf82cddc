use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Find customers present in a new CSV/Excel snapshot but missing from the old one",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two snapshots and show the records that are new
    Compare(CompareArgs),
    /// Compare two snapshots and write the new records to new_customers_<timestamp>.csv
    Export(ExportArgs),
    /// Load a single file and report the detected encoding, columns and first rows
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Previous snapshot (.csv, .xlsx or .xls)
    #[arg(long = "old")]
    pub old: PathBuf,
    /// Current snapshot (.csv, .xlsx or .xls)
    #[arg(long = "new")]
    pub new: PathBuf,
    /// Comma-separated key columns overriding automatic key inference
    #[arg(short = 'k', long = "key", value_delimiter = ',')]
    pub key: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Aligned table of the new records
    #[default]
    Table,
    /// Full comparison result as JSON
    Json,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub snapshots: SnapshotArgs,
    /// Output format
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Maximum number of rows to display in table format
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub snapshots: SnapshotArgs,
    /// Directory to write the export into, or '-' for stdout
    #[arg(short = 'o', long = "output", default_value = ".")]
    pub output: PathBuf,
    /// Character encoding for the exported file (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// File to load
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}
