//! CSV export of the added records and its hand-off to an [`ExportSink`].

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use log::info;

use crate::{diff::DiffResult, io_utils};

pub const EXPORT_FILE_PREFIX: &str = "new_customers_";

/// Serializes the added records under the full column union. Returns an
/// empty string when nothing was added.
pub fn to_csv(result: &DiffResult) -> Result<String> {
    if !result.has_additions() {
        return Ok(String::new());
    }
    let mut writer = io_utils::open_csv_writer(Vec::new());
    writer
        .write_record(&result.column_names)
        .context("Writing export header")?;
    for row in result.added_rows() {
        writer
            .write_record(
                result
                    .column_names
                    .iter()
                    .map(|column| row.new_data.get(column)),
            )
            .with_context(|| format!("Writing export row {}", row.row_index))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing export buffer: {}", err.error()))?;
    let mut text = String::from_utf8(bytes).context("Export buffer is not UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// `new_customers_YYYYMMDD_HHMMSS.csv` in UTC.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn mime_type(encoding: &'static Encoding) -> String {
    format!("text/csv; charset={}", encoding.name().to_lowercase())
}

/// Destination for an exported file.
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8], mime_type: &str) -> Result<()>;
}

/// Writes each export as a file inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8], mime_type: &str) -> Result<()> {
        let path = self.dir.join(file_name);
        fs::write(&path, bytes).with_context(|| format!("Writing export file {path:?}"))?;
        info!("Wrote {} byte(s) ({mime_type}) to {path:?}", bytes.len());
        self.written.push(path);
        Ok(())
    }
}

/// Streams the export bytes into any writer, e.g. stdout.
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ExportSink for WriterSink<W> {
    fn deliver(&mut self, file_name: &str, bytes: &[u8], _mime_type: &str) -> Result<()> {
        self.inner
            .write_all(bytes)
            .and_then(|_| self.inner.flush())
            .with_context(|| format!("Streaming export {file_name}"))
    }
}

/// Encodes the added records and hands them to `sink`. Returns the delivered
/// file name, or `None` when there was nothing to export.
pub fn export_added(
    result: &DiffResult,
    sink: &mut dyn ExportSink,
    encoding: &'static Encoding,
    at: DateTime<Utc>,
) -> Result<Option<String>> {
    let text = to_csv(result)?;
    if text.is_empty() {
        info!(
            "No new customers in '{}' relative to '{}'; nothing exported",
            result.new_source, result.old_source
        );
        return Ok(None);
    }
    let bytes = io_utils::encode_text(&text, encoding)?;
    let file_name = export_file_name(at);
    sink.deliver(&file_name, &bytes, &mime_type(encoding))?;
    Ok(Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn export_file_name_is_compact_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(export_file_name(at), "new_customers_20240309_070501.csv");
    }

    #[test]
    fn mime_type_names_the_charset() {
        assert_eq!(mime_type(encoding_rs::UTF_8), "text/csv; charset=utf-8");
        assert_eq!(
            mime_type(encoding_rs::SHIFT_JIS),
            "text/csv; charset=shift_jis"
        );
    }
}
