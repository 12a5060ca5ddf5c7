//! Concatenate cleaned group tables into one table tagged by source.
//!
//! Each artifact contributes its rows in order, with the artifact's source
//! identifier appended as the last column. Rows are padded to the widest
//! artifact so the `source` column lines up.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Artifact, Row, Table};

static GROUP_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"group_(\d+)").expect("valid regex"));

/// Header of the appended source column.
pub const SOURCE_COLUMN: &str = "source";

/// Numeric id from names like `group_607317.csv`, else the file stem.
pub fn source_identifier(file_name: &str) -> String {
    if let Some(caps) = GROUP_ID.captures(file_name) {
        return caps[1].to_string();
    }
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// Combine artifacts in the given order. `None` when there is nothing to
/// combine.
pub fn combine(artifacts: &[Artifact]) -> Option<Table> {
    let width = artifacts.iter().map(|a| a.table.width()).max()?;

    let mut headers: Vec<String> = (0..width).map(|i| i.to_string()).collect();
    headers.push(SOURCE_COLUMN.to_string());

    let mut rows = Vec::new();
    for artifact in artifacts {
        let source = source_identifier(&artifact.name);
        for row in &artifact.table.rows {
            let mut cells = row.cells.clone();
            cells.resize(width, String::new());
            cells.push(source.clone());
            rows.push(Row::new(cells));
        }
    }

    Some(Table::with_headers(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, rows: &[&[&str]]) -> Artifact {
        let rows = rows.iter().map(|r| r.iter().copied().collect()).collect();
        Artifact::new(name, Table::headerless(rows))
    }

    #[test]
    fn test_source_identifier() {
        assert_eq!(source_identifier("group_607317.csv"), "607317");
        assert_eq!(source_identifier("final_group_12_v2.csv"), "12");
        assert_eq!(source_identifier("group_Box_3.csv"), "group_Box_3");
        assert_eq!(source_identifier("notes.csv"), "notes");
    }

    #[test]
    fn test_combine_tags_and_preserves_order() {
        let artifacts = vec![
            artifact("group_2.csv", &[&["a", "1"], &["b", "2"]]),
            artifact("group_1.csv", &[&["c", "3"]]),
        ];

        let combined = combine(&artifacts).unwrap();

        assert_eq!(combined.len(), 3);
        assert_eq!(combined.headers.as_ref().unwrap(), &["0", "1", "source"]);
        let order: Vec<(&str, &str)> = combined
            .rows
            .iter()
            .map(|r| (r.cell(0), r.cell(2)))
            .collect();
        assert_eq!(order, vec![("a", "2"), ("b", "2"), ("c", "1")]);
    }

    #[test]
    fn test_combine_pads_narrow_artifacts() {
        let artifacts = vec![
            artifact("group_1.csv", &[&["a"]]),
            artifact("group_2.csv", &[&["b", "x", "y"]]),
        ];

        let combined = combine(&artifacts).unwrap();

        assert_eq!(combined.rows[0].cells, vec!["a", "", "", "1"]);
        assert_eq!(combined.rows[1].cells, vec!["b", "x", "y", "2"]);
    }

    #[test]
    fn test_row_count_is_sum_and_sources_non_empty() {
        let artifacts = vec![
            artifact("group_5.csv", &[&["a"], &["b"]]),
            artifact("other.csv", &[&["c"]]),
        ];

        let combined = combine(&artifacts).unwrap();
        let expected: usize = artifacts.iter().map(|a| a.table.len()).sum();

        assert_eq!(combined.len(), expected);
        assert!(combined.rows.iter().all(|r| !r.cell(1).is_empty()));
    }

    #[test]
    fn test_nothing_to_combine() {
        assert!(combine(&[]).is_none());
    }
}
