//! Build an XBRL instance from an annotated table.
//!
//! ```text
//! ID | path1  | field  | value            <xbrli:xbrl ...>
//! 1  | bd-t:A | bd-i:x | 5          →       <link:schemaRef .../>
//! 2  | bd-t:A | bd-i:y | 7                  <xbrli:context id="ctx1">..
//!                                            <bd-t:A>
//!                                              <bd-i:x contextRef="ctx1">5</bd-i:x>
//!                                              <bd-i:y contextRef="ctx1">7</bd-i:y>
//! ```
//!
//! Rows whose names do not parse or resolve are reported and skipped; the
//! rest of the document is still produced.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::namespaces::{NamespaceTable, DEFAULT_CONTEXT_ID, DEFAULT_SCHEMA_URL};
use super::tree::XmlElement;
use crate::error::{TableResult, XmlError, XmlResult};
use crate::logs::{log_info_indent, log_warning};
use crate::models::{PathKeyedField, QName, Table};

/// How rows become parent elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingMode {
    /// One parent per distinct `path1`; rows of different IDs are merged.
    #[default]
    MergeByPath,
    /// One parent per distinct `(path1, ID)` pair.
    SplitById,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbrlOptions {
    pub schema_url: String,
    pub context_id: String,
    pub grouping: GroupingMode,
}

impl Default for XbrlOptions {
    fn default() -> Self {
        Self {
            schema_url: DEFAULT_SCHEMA_URL.to_string(),
            context_id: DEFAULT_CONTEXT_ID.to_string(),
            grouping: GroupingMode::default(),
        }
    }
}

/// A row that could not be turned into a fact.
#[derive(Debug)]
pub struct SkippedRow {
    /// Zero-based data row index.
    pub index: usize,
    pub error: XmlError,
}

/// Assembled document plus the rows left out of it.
#[derive(Debug)]
pub struct XbrlDocument {
    pub root: XmlElement,
    pub fields: usize,
    pub skipped: Vec<SkippedRow>,
}

impl XbrlDocument {
    pub fn to_xml_string(&self) -> XmlResult<String> {
        self.root.to_xml_string(2)
    }
}

/// Read the `ID`, `path1`, `field`, `value` columns. A missing column fails
/// the whole table; a bad name only fails its row.
pub fn extract_fields(
    table: &Table,
    namespaces: &NamespaceTable,
) -> TableResult<(Vec<PathKeyedField>, Vec<SkippedRow>)> {
    let id_col = table.column_index("ID")?;
    let path_col = table.column_index("path1")?;
    let field_col = table.column_index("field")?;
    let value_col = table.column_index("value")?;

    let mut fields = Vec::new();
    let mut skipped = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        let parsed = parse_field(row.key(path_col), row.key(field_col), namespaces);
        match parsed {
            Ok((path, field)) => fields.push(PathKeyedField {
                id: row.key(id_col).to_string(),
                path,
                field,
                value: row.key(value_col).to_string(),
            }),
            Err(error) => {
                log_warning(format!("Row {}: {}", index, error));
                skipped.push(SkippedRow { index, error });
            }
        }
    }

    Ok((fields, skipped))
}

fn parse_field(path: &str, field: &str, namespaces: &NamespaceTable) -> XmlResult<(QName, QName)> {
    let path = QName::parse(path)?;
    let field = QName::parse(field)?;
    namespaces.resolve(&path)?;
    namespaces.resolve(&field)?;
    Ok((path, field))
}

/// Group fields by parent, keeping first-seen order of parents and rows.
pub fn group_fields(fields: &[PathKeyedField], mode: GroupingMode) -> Vec<(&QName, Vec<&PathKeyedField>)> {
    let mut groups: Vec<(&QName, Vec<&PathKeyedField>)> = Vec::new();
    let mut index: HashMap<(&QName, Option<&str>), usize> = HashMap::new();

    for field in fields {
        let id = match mode {
            GroupingMode::MergeByPath => None,
            GroupingMode::SplitById => Some(field.id.as_str()),
        };
        let slot = *index.entry((&field.path, id)).or_insert_with(|| {
            groups.push((&field.path, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(field);
    }

    groups
}

/// Build the instance document from already-extracted fields.
pub fn build_document(
    fields: &[PathKeyedField],
    namespaces: &NamespaceTable,
    options: &XbrlOptions,
) -> XmlElement {
    let mut root = XmlElement::new("xbrli:xbrl");
    for (key, uri) in namespaces.declarations() {
        root.attributes.push((key, uri.to_string()));
    }

    root.push(XmlElement::new("link:schemaRef").with_attrs(&[
        ("xlink:type", "simple"),
        ("xlink:href", options.schema_url.as_str()),
    ]));
    root.push(
        XmlElement::new("xbrli:context")
            .with_attr("id", &options.context_id)
            .with_child(XmlElement::new("xbrli:entity")),
    );

    for (path, members) in group_fields(fields, options.grouping) {
        log_info_indent(format!("Path {}: {} field(s)", path, members.len()), 1);
        let parent = root.push(XmlElement::new(path.to_string()));
        for field in members {
            parent.push(
                XmlElement::new(field.field.to_string())
                    .with_attr("contextRef", &options.context_id)
                    .with_text(&field.value),
            );
        }
    }

    root
}

/// Table → XBRL document.
pub fn assemble(table: &Table, options: &XbrlOptions) -> TableResult<XbrlDocument> {
    let namespaces = NamespaceTable::builtin();
    let (fields, skipped) = extract_fields(table, &namespaces)?;
    let root = build_document(&fields, &namespaces, options);

    Ok(XbrlDocument {
        root,
        fields: fields.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    fn table(rows: &[[&str; 4]]) -> Table {
        Table::with_headers(
            vec!["ID".into(), "path1".into(), "field".into(), "value".into()],
            rows.iter().map(|r| r.iter().copied().collect::<Row>()).collect(),
        )
    }

    #[test]
    fn test_rows_merged_under_one_path() {
        let input = table(&[["1", "bd-t:A", "bd-i:x", "5"], ["2", "bd-t:A", "bd-i:y", "7"]]);

        let doc = assemble(&input, &XbrlOptions::default()).unwrap();

        let parents: Vec<&XmlElement> = doc.root.children_named("bd-t:A").collect();
        assert_eq!(parents.len(), 1);
        let children: Vec<(&str, Option<&str>)> = parents[0]
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.text.as_deref()))
            .collect();
        assert_eq!(children, vec![("bd-i:x", Some("5")), ("bd-i:y", Some("7"))]);
        assert_eq!(parents[0].children[0].attribute("contextRef"), Some("ctx1"));
    }

    #[test]
    fn test_document_preamble() {
        let doc = assemble(&table(&[]), &XbrlOptions::default()).unwrap();

        assert_eq!(doc.root.name, "xbrli:xbrl");
        let schema_ref = &doc.root.children[0];
        assert_eq!(schema_ref.name, "link:schemaRef");
        assert_eq!(schema_ref.attribute("xlink:type"), Some("simple"));
        assert_eq!(schema_ref.attribute("xlink:href"), Some(DEFAULT_SCHEMA_URL));
        let context = &doc.root.children[1];
        assert_eq!(context.attribute("id"), Some("ctx1"));
        assert_eq!(context.children[0].name, "xbrli:entity");
        assert_eq!(
            doc.root.attribute("xmlns:bd-t"),
            Some("http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-tuples")
        );
    }

    #[test]
    fn test_unknown_prefix_skips_only_that_row() {
        let input = table(&[
            ["1", "bd-t:A", "bd-i:x", "5"],
            ["2", "zz:B", "bd-i:y", "7"],
            ["3", "bd-t:A", "nope", "9"],
            ["4", "bd-t:C", "bd-i:z", "1"],
        ]);

        let doc = assemble(&input, &XbrlOptions::default()).unwrap();

        assert_eq!(doc.fields, 2);
        assert_eq!(doc.skipped.len(), 2);
        assert!(matches!(doc.skipped[0].error, XmlError::UnknownPrefix(ref p) if p == "zz"));
        assert!(matches!(doc.skipped[1].error, XmlError::InvalidQName(_)));
        assert!(doc.root.find("bd-i:x").is_some());
        assert!(doc.root.find("bd-i:z").is_some());
        assert!(doc.root.find("zz:B").is_none());
    }

    #[test]
    fn test_invalid_xml_name_skips_row() {
        let input = table(&[["1", "bd-t:A", "bd-i:x", "5"], ["2", "bd-t:A", "bd-i:bad name", "7"]]);

        let doc = assemble(&input, &XbrlOptions::default()).unwrap();

        assert_eq!(doc.fields, 1);
        assert_eq!(doc.skipped.len(), 1);
        assert_eq!(doc.skipped[0].index, 1);
        assert!(matches!(doc.skipped[0].error, XmlError::InvalidQName(_)));

        let xml = doc.to_xml_string().unwrap();
        assert!(!xml.contains("bad name"));
        let reparsed = XmlElement::parse(&xml).unwrap();
        assert_eq!(reparsed.find("bd-i:x").unwrap().text.as_deref(), Some("5"));
    }

    #[test]
    fn test_first_seen_path_order() {
        let input = table(&[
            ["1", "bd-t:B", "bd-i:x", "1"],
            ["1", "bd-t:A", "bd-i:x", "2"],
            ["1", "bd-t:B", "bd-i:y", "3"],
        ]);

        let doc = assemble(&input, &XbrlOptions::default()).unwrap();
        let names: Vec<&str> = doc.root.children[2..].iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["bd-t:B", "bd-t:A"]);
        assert_eq!(doc.root.children[2].children.len(), 2);
    }

    #[test]
    fn test_split_by_id() {
        let input = table(&[
            ["1", "bd-t:A", "bd-i:x", "5"],
            ["2", "bd-t:A", "bd-i:x", "6"],
            ["1", "bd-t:A", "bd-i:y", "7"],
        ]);
        let options = XbrlOptions {
            grouping: GroupingMode::SplitById,
            ..XbrlOptions::default()
        };

        let doc = assemble(&input, &options).unwrap();
        let parents: Vec<&XmlElement> = doc.root.children_named("bd-t:A").collect();

        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].children.len(), 2);
        assert_eq!(parents[1].children[0].text.as_deref(), Some("6"));
    }

    #[test]
    fn test_missing_column_fails() {
        let input = Table::with_headers(vec!["ID".into(), "path1".into()], vec![]);
        assert!(assemble(&input, &XbrlOptions::default()).is_err());
    }

    #[test]
    fn test_serialized_document() {
        let input = table(&[["1", "bd-t:A", "bd-i:x", " 5 "]]);
        let xml = assemble(&input, &XbrlOptions::default())
            .unwrap()
            .to_xml_string()
            .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<bd-i:x contextRef=\"ctx1\">5</bd-i:x>"));
        assert!(xml.contains("<xbrli:entity/>"));

        let reparsed = XmlElement::parse(&xml).unwrap();
        assert_eq!(reparsed.find("bd-i:x").unwrap().text.as_deref(), Some("5"));
    }
}
