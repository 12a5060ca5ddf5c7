//! Partition spreadsheet rows into groups, one artifact per group.
//!
//! ```text
//! Processed sheet (headerless)        group_<key>.csv files
//! ┌──────────────────────────┐       ┌───────────────────────┐
//! │ .. C: 607317 .. K: b     │       │ group_607317.csv      │
//! │ .. C: 607317 .. K: a     │  →    │   ..a.. / ..b..       │
//! │ .. C: 607318 .. K: z     │       ├───────────────────────┤
//! │ .. C: (empty)            │       │ group_607318.csv      │
//! └──────────────────────────┘       └───────────────────────┘
//! ```
//!
//! Rows with an empty key are dropped. Groups come out in ascending key
//! order; rows inside a group are ordered by the sort column.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Artifact, Group, Row, Table};
use crate::parser::workbook::MAX_SHEET_NAME_LEN;

/// Which columns drive the grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOptions {
    /// Zero-based key columns. The first one decides whether a row is kept.
    pub key_columns: Vec<usize>,
    /// Zero-based column to order rows by inside each group.
    pub sort_column: Option<usize>,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            key_columns: vec![2],
            sort_column: Some(10),
        }
    }
}

/// Partition `table` into groups keyed by the trimmed key column values.
pub fn group_rows(table: &Table, options: &GroupOptions) -> Vec<Group> {
    let mut groups: BTreeMap<Vec<String>, Vec<Row>> = BTreeMap::new();

    let Some(&primary) = options.key_columns.first() else {
        return Vec::new();
    };

    for row in &table.rows {
        if row.key(primary).is_empty() {
            continue;
        }
        let key = options
            .key_columns
            .iter()
            .map(|&c| row.key(c).to_string())
            .collect();
        groups.entry(key).or_default().push(row.clone());
    }

    groups
        .into_iter()
        .map(|(key, mut rows)| {
            if let Some(sort_column) = options.sort_column {
                rows.sort_by(|a, b| compare_cells(a.key(sort_column), b.key(sort_column)));
            }
            Group { key, rows }
        })
        .collect()
}

/// Ascending order: numbers numerically, other text lexically, blanks last.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// File-system safe identifier for a group key, at most
/// [`MAX_SHEET_NAME_LEN`] characters.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect()
}

/// Make `id` distinct from every id in `used` (compared case-insensitively)
/// by appending `_2`, `_3`, ... within [`MAX_SHEET_NAME_LEN`] characters.
fn unique_identifier(id: String, used: &mut HashSet<String>) -> String {
    let mut candidate = id.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!("_{}", n);
        let keep = MAX_SHEET_NAME_LEN - suffix.len();
        candidate = id.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

/// Materialise groups as named headerless tables, `group_<id>.csv`. Keys that
/// sanitize to the same id get a numeric suffix so no artifact overwrites
/// another.
pub fn to_artifacts(groups: Vec<Group>) -> Vec<Artifact> {
    let mut used = HashSet::new();
    groups
        .into_iter()
        .map(|group| {
            let id = unique_identifier(sanitize_identifier(&group.label()), &mut used);
            Artifact::new(format!("group_{}.csv", id), Table::headerless(group.rows))
        })
        .collect()
}
