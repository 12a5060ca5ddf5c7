//! Lay out path groups horizontally, one sheet per group.
//!
//! Rows are grouped by their three path columns. Each sheet carries the path
//! in its first three cells and the group's values side by side from column
//! E on: the label column in the first row, the value column in the second.
//! A group whose second path is empty is a parent; later groups sharing its
//! first path are listed on the parent sheet as subgroups.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::grouper::compare_cells;
use crate::error::{TableError, TableResult};
use crate::models::{Row, Table};
use crate::parser::workbook::{SheetLayout, MAX_SHEET_NAME_LEN};

/// Column positions used by the transposer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransposeOptions {
    /// The three path columns (H, I, J).
    pub path_columns: [usize; 3],
    /// Column naming the sheet (C).
    pub name_column: usize,
    /// Sort column, written on the first sheet row (K).
    pub label_column: usize,
    /// Value column, written on the second sheet row (Q).
    pub value_column: usize,
}

impl Default for TransposeOptions {
    fn default() -> Self {
        Self {
            path_columns: [7, 8, 9],
            name_column: 2,
            label_column: 10,
            value_column: 16,
        }
    }
}

/// First column holding group values (E).
const FIRST_VALUE_COLUMN: u16 = 4;

/// Build the sheets of the transposed workbook.
pub fn transpose(table: &Table, options: &TransposeOptions) -> TableResult<Vec<SheetLayout>> {
    let mut groups: BTreeMap<[String; 3], Vec<&Row>> = BTreeMap::new();
    for row in &table.rows {
        let key = options.path_columns.map(|c| row.key(c).to_string());
        groups.entry(key).or_default().push(row);
    }

    let mut sheets: Vec<SheetLayout> = Vec::new();
    let mut used_names = HashSet::new();
    // parent path -> (sheet index, group size, subgroup names)
    let mut parents: HashMap<String, (usize, usize, Vec<String>)> = HashMap::new();

    for (path, mut rows) in groups {
        if path[0].is_empty() {
            continue;
        }
        rows.sort_by(|a, b| {
            compare_cells(a.key(options.label_column), b.key(options.label_column))
        });

        let base_name = rows[0].key(options.name_column).to_string();
        let name = unique_sheet_name(&base_name, &mut used_names);

        let mut sheet = SheetLayout::new(name.clone());
        for (col, part) in path.iter().enumerate() {
            sheet.put(0, col as u16, part.as_str());
        }
        for (i, row) in rows.iter().enumerate() {
            let col = value_column(i)?;
            sheet.put(0, col, row.cell(options.label_column));
            sheet.put(1, col, row.cell(options.value_column));
        }

        if path[1].is_empty() {
            parents.insert(path[0].clone(), (sheets.len(), rows.len(), Vec::new()));
        } else if let Some((_, _, subgroups)) = parents.get_mut(&path[0]) {
            subgroups.push(name);
        }

        sheets.push(sheet);
    }

    for (index, size, subgroups) in parents.into_values() {
        if subgroups.is_empty() {
            continue;
        }
        let col = value_column(size + 1)?;
        sheets[index].put(0, col, format!("Subgroups: {}", subgroups.join(", ")));
    }

    Ok(sheets)
}

/// Sheet column `offset` places right of the first value column.
fn value_column(offset: usize) -> TableResult<u16> {
    usize::from(FIRST_VALUE_COLUMN)
        .checked_add(offset)
        .and_then(|col| u16::try_from(col).ok())
        .ok_or_else(|| TableError::Workbook(format!("Group too wide: {} values", offset)))
}

/// Truncate to the sheet-name limit and make unique with a numeric suffix.
fn unique_sheet_name(base: &str, used: &mut HashSet<String>) -> String {
    let base = if base.is_empty() { "Sheet" } else { base };
    let truncated: String = base.chars().take(MAX_SHEET_NAME_LEN).collect();

    let mut candidate = truncated.clone();
    let mut n = 1;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = n.to_string();
        let keep = MAX_SHEET_NAME_LEN - suffix.len();
        candidate = truncated.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}
