//! Turns an uploaded file into a [`Table`].
//!
//! Delimited text goes through the decoder chain in [`crate::encoding`]:
//! strict candidates with a mojibake check first, then the byte-sniffed
//! fallbacks, then a lossy UTF-8 decode that is returned whatever it
//! contains. Spreadsheets are read through `calamine`, first sheet only.

use std::io::Cursor;

use anyhow::{Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use log::{debug, info, warn};

use crate::{
    encoding::{self, Decoder, TextQuality},
    error::LoadError,
    io_utils,
    record::Table,
};

/// Number of records serialized for the mojibake check.
pub const QUALITY_SAMPLE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, LoadError> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".csv") {
            Ok(SourceFormat::Delimited)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(SourceFormat::Spreadsheet)
        } else {
            Err(LoadError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })
        }
    }
}

pub fn load(bytes: &[u8], file_name: &str) -> Result<Table, LoadError> {
    match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Delimited => load_delimited(bytes, file_name),
        SourceFormat::Spreadsheet => load_spreadsheet(bytes, file_name),
    }
}

/// Outcome of one decoder strategy.
enum Attempt {
    Accepted(Table),
    Rejected(String),
}

pub fn load_delimited(bytes: &[u8], file_name: &str) -> Result<Table, LoadError> {
    for decoder in encoding::candidate_decoders() {
        match attempt(bytes, file_name, decoder, true) {
            Attempt::Accepted(table) => return Ok(table),
            Attempt::Rejected(reason) => {
                debug!(
                    "'{file_name}': {} rejected ({reason})",
                    decoder.encoding().name()
                );
            }
        }
    }

    warn!("'{file_name}': no candidate encoding produced clean text, falling back");
    for decoder in encoding::fallback_decoders(bytes) {
        match attempt(bytes, file_name, decoder, false) {
            Attempt::Accepted(table) => return Ok(table),
            Attempt::Rejected(reason) => {
                debug!(
                    "'{file_name}': fallback {:?} rejected ({reason})",
                    decoder
                );
            }
        }
    }

    let text = encoding::decode_lossy(bytes);
    parse_delimited(&text, file_name)
        .map(|table| {
            warn!("'{file_name}': decoded as UTF-8 with replacement characters");
            table.with_encoding(encoding_rs::UTF_8.name())
        })
        .map_err(|err| LoadError::DecodeFailure {
            file_name: file_name.to_string(),
            reason: format!("{err:#}"),
        })
}

fn attempt(bytes: &[u8], file_name: &str, decoder: Decoder, check_quality: bool) -> Attempt {
    let Some(text) = decoder.decode(bytes) else {
        return Attempt::Rejected("malformed byte sequence".to_string());
    };
    let table = match parse_delimited(&text, file_name) {
        Ok(table) => table,
        Err(err) => return Attempt::Rejected(format!("{err:#}")),
    };
    if check_quality {
        let quality = TextQuality::measure(&sample_text(&table));
        if !quality.is_acceptable() {
            return Attempt::Rejected(format!(
                "corrupt ratio {:.3} ({} corrupt, {} japanese, {} total)",
                quality.corrupt_ratio(),
                quality.corrupt,
                quality.japanese,
                quality.total
            ));
        }
    }
    let name = decoder.encoding().name();
    info!(
        "Decoded '{file_name}' as {name}: {} column(s), {} row(s)",
        table.headers.len(),
        table.len()
    );
    Attempt::Accepted(table.with_encoding(name))
}

/// Header line plus the first few records, comma-joined.
fn sample_text(table: &Table) -> String {
    let mut lines = Vec::with_capacity(QUALITY_SAMPLE_ROWS + 1);
    lines.push(table.headers.join(","));
    for record in table.records.iter().take(QUALITY_SAMPLE_ROWS) {
        lines.push(record.iter().map(|(_, value)| value).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

/// Parses already-decoded comma-separated text whose first record is the
/// header row. Blank lines are skipped; rows wider than the header are an
/// error.
pub fn parse_delimited(text: &str, source_name: &str) -> Result<Table> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes());
    let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| anyhow!("Reading row {}: {err}", row_idx + 2))?;
        if record.len() > raw_headers.len() {
            return Err(anyhow!(
                "Row {} has {} field(s) but the header has {}",
                row_idx + 2,
                record.len(),
                raw_headers.len()
            ));
        }
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(Table::from_rows(source_name, &raw_headers, &rows))
}

pub fn load_spreadsheet(bytes: &[u8], file_name: &str) -> Result<Table, LoadError> {
    let malformed = |reason: String| LoadError::MalformedSpreadsheet {
        file_name: file_name.to_string(),
        reason,
    };
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| malformed(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| malformed("workbook contains no sheets".to_string()))?
        .map_err(|err| malformed(err.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();
    let body: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    let table = Table::from_rows(file_name, &headers, &body);
    info!(
        "Read first sheet of '{file_name}': {} column(s), {} row(s)",
        table.headers.len(),
        table.len()
    );
    Ok(table)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_format_is_case_insensitive() {
        assert_eq!(
            SourceFormat::from_file_name("Customers.CSV").unwrap(),
            SourceFormat::Delimited
        );
        assert_eq!(
            SourceFormat::from_file_name("export.Xls").unwrap(),
            SourceFormat::Spreadsheet
        );
        assert!(matches!(
            SourceFormat::from_file_name("notes.txt"),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parse_delimited_skips_blank_lines_and_pads_short_rows() {
        let table = parse_delimited("email,name\n\na@x.com\n\nb@x.com,B\n", "t.csv").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].get("name"), "");
        assert!(table.records[0].contains_column("name"));
        assert_eq!(table.records[1].get("name"), "B");
    }

    #[test]
    fn parse_delimited_rejects_rows_wider_than_header() {
        let err = parse_delimited("a,b\n1,2,3\n", "t.csv").unwrap_err();
        assert!(format!("{err}").contains("Row 2"));
    }

    #[test]
    fn parse_delimited_accepts_empty_input() {
        let table = parse_delimited("", "empty.csv").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn sample_text_includes_header_line() {
        let table = parse_delimited("氏名,メール\n山田,y@x.jp\n", "t.csv").unwrap();
        assert_eq!(sample_text(&table), "氏名,メール\n山田,y@x.jp");
    }
}
