use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{diff::DiffResult, record::Table};

/// Renders the added rows of a comparison under the full column union.
/// `limit` caps the number of rows shown; `None` shows all of them.
pub fn render_added(result: &DiffResult, limit: Option<usize>) -> String {
    let rows: Vec<Vec<String>> = result
        .added_rows()
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| {
            result
                .column_names
                .iter()
                .map(|column| row.new_data.get(column).to_string())
                .collect()
        })
        .collect();
    render_rows(&result.column_names, &rows)
}

/// Renders the first `rows` records of a loaded table.
pub fn render_preview(table: &Table, rows: usize) -> String {
    let body: Vec<Vec<String>> = table
        .records
        .iter()
        .take(rows)
        .map(|record| {
            table
                .headers
                .iter()
                .map(|column| record.get(column).to_string())
                .collect()
        })
        .collect();
    render_rows(&table.headers, &body)
}

pub fn render_rows(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    line
}

/// Terminal columns occupied by `value`; East Asian wide and full-width
/// characters take two.
pub fn display_width(value: &str) -> usize {
    value.chars().map(|ch| if is_wide(ch) { 2 } else { 1 }).sum()
}

fn is_wide(ch: char) -> bool {
    matches!(ch,
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{303E}'
        | '\u{3041}'..='\u{33FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{A000}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}'
    )
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
