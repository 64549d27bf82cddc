//! Finds the records of a new snapshot that are missing from an old one.
//!
//! Identity is decided by a [`JoinKey`] inferred from the column names both
//! tables share, preferring e-mail columns, then personal names, then company
//! names. Two records are the same customer iff their [`normalized_key`]
//! values are equal.

use std::collections::HashSet;

use itertools::Itertools;
use log::debug;

use crate::{
    diff::{DiffResult, DiffRow, DiffSummary},
    record::{Record, Table},
};

pub const KEY_SEPARATOR: &str = "\u{1f}";

pub const EMAIL_ALIASES: &[&str] = &[
    "email",
    "Email",
    "EMAIL",
    "e-mail",
    "E-mail",
    "mail",
    "メールアドレス",
    "メール",
];

pub const PERSON_NAME_ALIASES: &[&str] = &[
    "name",
    "Name",
    "NAME",
    "full_name",
    "氏名",
    "名前",
    "お名前",
    "担当者名",
    "担当者",
];

pub const COMPANY_ALIASES: &[&str] = &[
    "company",
    "Company",
    "COMPANY",
    "company_name",
    "会社名",
    "企業名",
    "法人名",
    "会社",
    "企業",
];

/// Alias groups in priority order.
pub const ALIAS_GROUPS: &[&[&str]] = &[EMAIL_ALIASES, PERSON_NAME_ALIASES, COMPANY_ALIASES];

/// Ordered list of column names that together identify a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinKey(Vec<String>);

impl JoinKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JoinKey(columns.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Column names present in both tables, in old-table order.
pub fn shared_columns(old: &Table, new: &Table) -> Vec<String> {
    old.headers
        .iter()
        .filter(|name| new.has_column(name))
        .cloned()
        .collect()
}

pub fn find_join_key(old: &Table, new: &Table) -> JoinKey {
    let shared = shared_columns(old, new);
    let mut chosen: Vec<String> = Vec::new();
    for alias in ALIAS_GROUPS.iter().flat_map(|group| group.iter()) {
        let hit = shared.iter().find(|column| {
            !column.is_empty() && (column.contains(alias) || alias.contains(column.as_str()))
        });
        if let Some(column) = hit {
            if !chosen.contains(column) {
                chosen.push(column.clone());
            }
        }
    }
    if chosen.is_empty() {
        if let Some(first) = shared.first() {
            chosen.push(first.clone());
        }
    }
    JoinKey(chosen)
}

/// Trimmed, lower-cased key cells joined in key order. Blank cells are left
/// out; `None` when every key cell is blank.
pub fn normalized_key(record: &Record, key: &JoinKey) -> Option<String> {
    let parts: Vec<String> = key
        .columns()
        .iter()
        .map(|column| record.get(column).trim())
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(KEY_SEPARATOR))
    }
}

/// Old headers followed by the new-only headers, first occurrence kept.
pub fn column_union(old: &Table, new: &Table) -> Vec<String> {
    old.headers
        .iter()
        .chain(new.headers.iter())
        .unique()
        .cloned()
        .collect()
}

pub fn compare(old: &Table, new: &Table) -> DiffResult {
    let key = find_join_key(old, new);
    compare_with_key(old, new, &key)
}

pub fn compare_with_key(old: &Table, new: &Table, key: &JoinKey) -> DiffResult {
    debug!(
        "Join key for '{}' -> '{}': {:?}",
        old.source_name,
        new.source_name,
        key.columns()
    );

    let seen: HashSet<String> = old
        .records
        .iter()
        .filter_map(|record| normalized_key(record, key))
        .collect();

    let rows: Vec<DiffRow> = new
        .records
        .iter()
        .filter(|record| {
            normalized_key(record, key).is_some_and(|value| !seen.contains(&value))
        })
        .enumerate()
        .map(|(row_index, record)| DiffRow::added(row_index, record.clone()))
        .collect();

    debug!(
        "{} distinct old key(s), {} added record(s)",
        seen.len(),
        rows.len()
    );

    DiffResult {
        summary: DiffSummary::added_only(rows.len()),
        column_names: column_union(old, new),
        rows,
        join_key: key.columns().to_vec(),
        old_source: old.source_name.clone(),
        new_source: new.source_name.clone(),
    }
}
