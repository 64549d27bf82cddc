//! The value produced by one comparison.
//!
//! The shape reserves removed/modified/unchanged counts and per-row old data
//! so consumers written against a full table diff keep working, but the
//! matcher only ever emits [`RowStatus::Added`] rows and leaves the other
//! counts at zero.

use serde::Serialize;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRow {
    /// Position in the output sequence, not in the source file.
    pub row_index: usize,
    pub status: RowStatus,
    pub old_data: Option<Record>,
    pub new_data: Record,
    pub changed_columns: Vec<String>,
}

impl DiffRow {
    pub fn added(row_index: usize, record: Record) -> Self {
        Self {
            row_index,
            status: RowStatus::Added,
            old_data: None,
            new_data: record,
            changed_columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_rows: usize,
    pub added_rows: usize,
    pub removed_rows: usize,
    pub modified_rows: usize,
    pub unchanged_rows: usize,
}

impl DiffSummary {
    pub fn added_only(added: usize) -> Self {
        Self {
            total_rows: added,
            added_rows: added,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub summary: DiffSummary,
    pub column_names: Vec<String>,
    pub rows: Vec<DiffRow>,
    pub join_key: Vec<String>,
    #[serde(rename = "file1Name")]
    pub old_source: String,
    #[serde(rename = "file2Name")]
    pub new_source: String,
}

impl DiffResult {
    pub fn added_rows(&self) -> impl Iterator<Item = &DiffRow> {
        self.rows.iter().filter(|row| row.status == RowStatus::Added)
    }

    pub fn has_additions(&self) -> bool {
        self.added_rows().next().is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
