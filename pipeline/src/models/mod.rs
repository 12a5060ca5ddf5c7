//! Domain models shared by the stages.
//!
//! - [`Row`] - positional cells of one spreadsheet/CSV line
//! - [`Table`] - rows plus an optional header
//! - [`Group`] - rows sharing a key, serialised to one artifact
//! - [`Artifact`] - named table consumed by the combiner
//! - [`QName`] - `prefix:local` qualified name
//! - [`PathKeyedField`] - one annotated row of the XBRL input

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult, XmlError, XmlResult};

// =============================================================================
// Rows and Tables
// =============================================================================

/// One line of tabular data, addressed by zero-based position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at `index`, or `""` past the end of the row.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell at `index`.
    pub fn key(&self, index: usize) -> &str {
        self.cell(index).trim()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `true` when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Rows with an optional header line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn headerless(rows: Vec<Row>) -> Self {
        Self { headers: None, rows }
    }

    pub fn with_headers(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            headers: Some(headers),
            rows,
        }
    }

    /// Position of a named column (exact match after trimming).
    pub fn column_index(&self, name: &str) -> TableResult<usize> {
        self.headers
            .as_ref()
            .and_then(|h| h.iter().position(|c| c.trim() == name))
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Widest row in the table.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Row::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Groups and Artifacts
// =============================================================================

/// Rows sharing equal values in the key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Trimmed key values, one per key column.
    pub key: Vec<String>,
    pub rows: Vec<Row>,
}

impl Group {
    /// Key values joined for display and naming.
    pub fn label(&self) -> String {
        self.key.join("_")
    }
}

/// A table together with the name it was read from or will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub table: Table,
}

impl Artifact {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

// =============================================================================
// Qualified Names
// =============================================================================

/// `prefix:local` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: String,
    pub local: String,
}

impl QName {
    /// Parse `prefix:local`; both parts must be XML names without a colon.
    pub fn parse(raw: &str) -> XmlResult<Self> {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((prefix, local)) if is_ncname(prefix) && is_ncname(local) => {
                Ok(Self {
                    prefix: prefix.to_string(),
                    local: local.to_string(),
                })
            }
            _ => Err(XmlError::InvalidQName(raw.to_string())),
        }
    }
}

/// Non-colonized XML name: a letter or `_`, then letters, digits, `-`, `.`,
/// `_` or `·`.
fn is_ncname(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '\u{B7}'))
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

/// One row of the annotated XBRL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKeyedField {
    pub id: String,
    pub path: QName,
    pub field: QName,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_cell_past_end() {
        let row: Row = ["a", " b "].into_iter().collect();
        assert_eq!(row.cell(1), " b ");
        assert_eq!(row.key(1), "b");
        assert_eq!(row.cell(7), "");
    }

    #[test]
    fn test_row_blank() {
        let row: Row = ["", "  "].into_iter().collect();
        assert!(row.is_blank());
    }

    #[test]
    fn test_column_index() {
        let table = Table::with_headers(vec!["ID".into(), " path1 ".into()], vec![]);
        assert_eq!(table.column_index("path1").unwrap(), 1);
        assert!(matches!(
            table.column_index("value"),
            Err(TableError::MissingColumn(c)) if c == "value"
        ));
    }

    #[test]
    fn test_qname_parse() {
        let q = QName::parse(" bd-t:TaxReturn ").unwrap();
        assert_eq!(q.prefix, "bd-t");
        assert_eq!(q.local, "TaxReturn");
        assert_eq!(q.to_string(), "bd-t:TaxReturn");

        let q = QName::parse("bd-i-ext1:Préface_v1.2").unwrap();
        assert_eq!(q.local, "Préface_v1.2");
    }

    #[test]
    fn test_qname_rejects_malformed() {
        for raw in [
            "noprefix",
            ":local",
            "prefix:",
            "a:b:c",
            "",
            "bd-i:bad name",
            "bd i:x",
            "bd-i:1st",
            "bd-i:-x",
            "bd-i:a<b",
            "bd-i:a&b",
        ] {
            assert!(QName::parse(raw).is_err(), "{raw} should be rejected");
        }
    }
}
