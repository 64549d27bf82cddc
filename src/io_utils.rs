//! I/O utilities shared by the loader, the exporter and the command handlers.
//!
//! - **Encoding labels**: `--output-encoding` values resolve through
//!   `encoding_rs`, defaulting to UTF-8.
//! - **Reader/writer construction**: every delimited-text parse and every CSV
//!   emission goes through `open_csv_reader` / `open_csv_writer` so the loader
//!   and the exporter share one quoting convention.
//! - **Inputs**: whole-file byte reads; `-` as an output path means stdout.

use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::{QuoteStyle, Terminator};
use encoding_rs::{Encoding, UTF_8};

pub const CSV_DELIMITER: u8 = b',';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Comma-separated reader with a header row and RFC 4180 quoting. Rows may be
/// shorter than the header; the caller decides what to do with longer ones.
pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(CSV_DELIMITER)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Comma-separated writer that only quotes fields containing the delimiter,
/// a quote or a line break, which is exactly what `open_csv_reader` undoes.
pub fn open_csv_writer<W>(writer: W) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(CSV_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'));
    builder.from_writer(writer)
}

/// Reads a whole input file into memory.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Reading input file {path:?}"))
}

/// File name used to label a table and pick its format.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (encoded, _output_encoding, had_errors) = encoding.encode(text);
    if had_errors {
        Err(anyhow!(
            "Text contains characters that cannot be represented in {}",
            encoding.name()
        ))
    } else {
        Ok(encoded.into_owned())
    }
}
