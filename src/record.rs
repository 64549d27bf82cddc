//! Header-keyed text records and the tables that hold them.
//!
//! Every cell is a string. A [`Record`] always exposes the full header set of
//! its [`Table`]; cells missing from the source become empty strings rather
//! than absent keys.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

/// One row, keyed by column name in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    /// Builds a record by zipping headers with a raw row. Short rows are
    /// padded with empty strings.
    pub fn from_row(headers: &[String], values: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), values.get(idx).cloned().unwrap_or_default()))
            .collect();
        Record(fields)
    }

    /// Cell value for `column`, or `""` when the record has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An ordered sequence of records read from one input file.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub source_name: String,
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    /// Name of the text encoding that produced a delimited table.
    pub encoding: Option<&'static str>,
}

impl Table {
    /// Builds a table from already-parsed rows, normalizing the header row.
    pub fn from_rows(
        source_name: impl Into<String>,
        raw_headers: &[String],
        rows: &[Vec<String>],
    ) -> Self {
        let headers = normalize_headers(raw_headers);
        let records = rows
            .iter()
            .map(|row| Record::from_row(&headers, row))
            .collect();
        Self {
            source_name: source_name.into(),
            headers,
            records,
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static str) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Blank header cells become `Unnamed: <index>` and repeated names get a
/// `.<n>` suffix so that every column name in a table is unique.
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, name) in raw.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.clone()
        };
        let mut candidate = base.clone();
        if used.contains(&candidate) {
            let suffix = suffixes.entry(base.clone()).or_insert(0);
            loop {
                *suffix += 1;
                candidate = format!("{base}.{suffix}");
                if !used.contains(&candidate) {
                    break;
                }
            }
        }
        used.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}
