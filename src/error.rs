use thiserror::Error;

/// Failures surfaced by the table loader. Any of these aborts the whole
/// comparison; the matcher itself never fails.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file format for '{file_name}': expected .csv, .xlsx or .xls")]
    UnsupportedFormat { file_name: String },

    #[error("Could not decode '{file_name}' as delimited text: {reason}")]
    DecodeFailure { file_name: String, reason: String },

    #[error("Could not read spreadsheet '{file_name}': {reason}")]
    MalformedSpreadsheet { file_name: String, reason: String },
}
