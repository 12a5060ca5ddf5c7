//! MapForce mapping definition (MFD) derived from an XBRL instance.
//!
//! The mapping skeleton is constant: an `input` component carrying the
//! instance path and an XBRL component bound to the instance's schema. Only
//! the schema URL is read from the instance.

use super::namespaces::{DEFAULT_SCHEMA_URL, LINK, XLINK};
use super::tree::XmlElement;
use crate::error::XmlResult;
use crate::logs::log_warning;

/// Name of the XBRL component, after the taxonomy entry point.
pub const XBRL_COMPONENT_NAME: &str = "bd-rpt-erf-aangifte-2024";

/// Instance written by the mapping.
pub const OUTPUT_INSTANCE: &str = "output.xbrl";

const INPUT_UID: &str = "6";
const XBRL_UID: &str = "7";

/// Namespaces listed in the XBRL component header. `None` is the
/// no-namespace entry.
const HEADER_NAMESPACES: &[Option<&str>] = &[
    Some("http://www.xbrl.org/2003/instance"),
    Some("http://www.altova.com/mapforce"),
    Some("http://www.xbrl.org/2003/linkbase"),
    Some("http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/nl-common-data"),
    Some("http://www.nltaxonomie.nl/2013/xbrl/sbr-dimensional-concepts"),
    Some("http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-data-ext1"),
    Some("http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-tuples-ext1"),
    Some("http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-tuples"),
    Some("view"),
    Some("http://www.nltaxonomie.nl/nt18/bd/20240221/presentation/bd-abstr-ext1"),
    None,
    Some("http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-data"),
];

/// `xlink:href` of the instance's `link:schemaRef`, if any.
pub fn find_schema_url(xbrl: &str) -> XmlResult<Option<String>> {
    let doc = roxmltree::Document::parse(xbrl)?;
    let url = doc
        .descendants()
        .find(|n| n.has_tag_name((LINK, "schemaRef")))
        .and_then(|n| n.attribute((XLINK, "href")))
        .map(str::to_string);
    Ok(url)
}

/// Schema URL of the instance, or the default entry point when the
/// instance has no schema reference.
pub fn schema_url_or_default(xbrl: &str) -> XmlResult<String> {
    match find_schema_url(xbrl)? {
        Some(url) => Ok(url),
        None => {
            log_warning("SchemaRef not found, using default");
            Ok(DEFAULT_SCHEMA_URL.to_string())
        }
    }
}

/// Build the mapping document for an instance at `xbrl_path`.
pub fn build_mapping(schema_url: &str, xbrl_path: &str) -> XmlElement {
    let mut mapping = XmlElement::new("mapping").with_attrs(&[
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ("version", "22"),
    ]);
    mapping.push(XmlElement::new("resources"));

    let component = mapping.push(XmlElement::new("component").with_attrs(&[
        ("name", "defaultmap"),
        ("uid", "1"),
        ("editable", "1"),
        ("blackbox", "0"),
    ]));
    component.push(XmlElement::new("properties").with_attr("SelectedLanguage", "builtin"));

    let structure = component.push(XmlElement::new("structure"));
    structure.push(
        XmlElement::new("children")
            .with_child(input_component(xbrl_path))
            .with_child(xbrl_component(schema_url, xbrl_path)),
    );
    structure.push(
        XmlElement::new("graph")
            .with_attr("directed", "1")
            .with_child(XmlElement::new("edges"))
            .with_child(
                XmlElement::new("vertices")
                    .with_child(vertex(INPUT_UID))
                    .with_child(vertex(XBRL_UID)),
            ),
    );

    mapping
}

fn input_component(xbrl_path: &str) -> XmlElement {
    XmlElement::new("component")
        .with_attrs(&[("name", "input"), ("library", "core"), ("uid", INPUT_UID), ("kind", "6")])
        .with_child(XmlElement::new("sources").with_child(XmlElement::new("datapoint")))
        .with_child(XmlElement::new("targets").with_child(XmlElement::new("datapoint")))
        .with_child(view_box("172", "46", "245", "82"))
        .with_child(
            XmlElement::new("data")
                .with_child(
                    XmlElement::new("input")
                        .with_attr("datatype", "string")
                        .with_text(xbrl_path),
                )
                .with_child(
                    XmlElement::new("parameter").with_attrs(&[("usageKind", "input"), ("name", "input")]),
                ),
        )
}

fn xbrl_component(schema_url: &str, xbrl_path: &str) -> XmlElement {
    let mut namespaces = XmlElement::new("namespaces");
    for uid in HEADER_NAMESPACES {
        let mut ns = XmlElement::new("namespace");
        if let Some(uid) = uid {
            ns = ns.with_attr("uid", *uid);
        }
        namespaces.push(ns);
    }

    XmlElement::new("component")
        .with_attrs(&[
            ("name", XBRL_COMPONENT_NAME),
            ("library", "xbrl"),
            ("uid", XBRL_UID),
            ("kind", "27"),
        ])
        .with_child(XmlElement::new("properties").with_attrs(&[
            ("XSLTTargetEncoding", "UTF-8"),
            ("XSLTDefaultOutput", "1"),
            ("XBRLShowAllConcepts", "1"),
            ("XBRLShowAllConceptsRaw", "1"),
        ]))
        .with_child(view_box("1426", "74", "2075", "1113"))
        .with_child(
            XmlElement::new("data")
                .with_child(
                    XmlElement::new("root")
                        .with_attr("scrollposition", "8472")
                        .with_child(XmlElement::new("header").with_child(namespaces)),
                )
                .with_child(XmlElement::new("xbrl").with_attrs(&[
                    ("schema", schema_url),
                    ("inputinstance", xbrl_path),
                    ("outputinstance", OUTPUT_INSTANCE),
                ])),
        )
}

fn view_box(ltx: &str, lty: &str, rbx: &str, rby: &str) -> XmlElement {
    XmlElement::new("view").with_attrs(&[("ltx", ltx), ("lty", lty), ("rbx", rbx), ("rby", rby)])
}

fn vertex(key: &str) -> XmlElement {
    XmlElement::new("vertex")
        .with_attr("vertexkey", key)
        .with_child(XmlElement::new("edges"))
}

/// XBRL text → mapping document.
pub fn assemble_mfd(xbrl: &str, xbrl_path: &str) -> XmlResult<XmlElement> {
    let schema_url = schema_url_or_default(xbrl)?;
    Ok(build_mapping(&schema_url, xbrl_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:link="http://www.xbrl.org/2003/linkbase"
            xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:schemaRef xlink:type="simple" xlink:href="http://example.org/custom-entrypoint.xsd"/>
</xbrli:xbrl>"#;

    fn xbrl_node(mapping: &XmlElement) -> &XmlElement {
        mapping.find("xbrl").unwrap()
    }

    #[test]
    fn test_schema_url_taken_from_instance() {
        let mapping = assemble_mfd(INSTANCE, "output.xbrl").unwrap();
        assert_eq!(
            xbrl_node(&mapping).attribute("schema"),
            Some("http://example.org/custom-entrypoint.xsd")
        );
    }

    #[test]
    fn test_default_schema_url_when_missing() {
        let xbrl = r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"/>"#;
        let mapping = assemble_mfd(xbrl, "output.xbrl").unwrap();
        assert_eq!(xbrl_node(&mapping).attribute("schema"), Some(DEFAULT_SCHEMA_URL));
    }

    #[test]
    fn test_schema_ref_matched_by_namespace_not_prefix() {
        let xbrl = r#"<x xmlns:l="http://www.xbrl.org/2003/linkbase" xmlns:xl="http://www.w3.org/1999/xlink">
  <l:schemaRef xl:href="urn:found"/>
</x>"#;
        assert_eq!(find_schema_url(xbrl).unwrap().as_deref(), Some("urn:found"));
    }

    #[test]
    fn test_unparseable_instance_is_error() {
        assert!(assemble_mfd("<not-closed>", "output.xbrl").is_err());
    }

    #[test]
    fn test_skeleton_shape() {
        let mapping = build_mapping("urn:schema", "in/output.xbrl");

        assert_eq!(mapping.attribute("version"), Some("22"));
        let children = mapping.find("children").unwrap();
        assert_eq!(children.children.len(), 2);
        assert_eq!(children.children[0].attribute("name"), Some("input"));
        assert_eq!(children.children[1].attribute("name"), Some(XBRL_COMPONENT_NAME));
        assert_eq!(mapping.find("input").unwrap().text.as_deref(), Some("in/output.xbrl"));

        let xbrl = xbrl_node(&mapping);
        assert_eq!(xbrl.attribute("inputinstance"), Some("in/output.xbrl"));
        assert_eq!(xbrl.attribute("outputinstance"), Some(OUTPUT_INSTANCE));

        let namespaces = mapping.find("namespaces").unwrap();
        assert_eq!(namespaces.children.len(), HEADER_NAMESPACES.len());

        let graph = mapping.find("graph").unwrap();
        assert_eq!(graph.attribute("directed"), Some("1"));
        let keys: Vec<_> = graph
            .find("vertices")
            .unwrap()
            .children
            .iter()
            .map(|v| v.attribute("vertexkey"))
            .collect();
        assert_eq!(keys, vec![Some("6"), Some("7")]);
    }

    #[test]
    fn test_serialized_with_four_space_indent() {
        let xml = build_mapping("urn:schema", "output.xbrl").to_xml_string(4).unwrap();
        assert!(xml.contains("\n    <resources/>"));
        assert!(xml.contains("<namespace/>"));
    }
}
