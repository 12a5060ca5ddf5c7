//! Ordered XML element tree with qualified (`prefix:local`) names.
//!
//! Built in memory by the assemblers, written with quick-xml, and read back
//! from text with roxmltree.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{XmlError, XmlResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `bd-t:A` or `mapping`.
    pub name: String,
    /// Attributes in document order, namespace declarations included.
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_attrs(mut self, attrs: &[(&str, &str)]) -> Self {
        for (k, v) in attrs {
            self.attributes.push((k.to_string(), v.to_string()));
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child and return it for further building.
    pub fn push(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Direct children with the given qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (depth-first, document order) with the given
    /// qualified name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }

    /// Serialize with an XML declaration and `indent` spaces per level.
    pub fn to_xml_string(&self, indent: usize) -> XmlResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_err)?;
        self.write_to(&mut writer)?;

        let mut xml =
            String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> XmlResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_err);
        }

        writer.write_event(Event::Start(start)).map_err(write_err)?;
        if let Some(ref text) = self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_err)
    }

    /// Parse a document into a tree. Namespace declarations are kept as
    /// `xmlns:*` attributes on the element that introduces them.
    pub fn parse(text: &str) -> XmlResult<XmlElement> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(from_node(doc.root_element()))
    }
}

fn write_err(err: impl std::fmt::Display) -> XmlError {
    XmlError::Write(err.to_string())
}

fn from_node(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let mut element = XmlElement::new(qualified(node, node.tag_name().namespace(), node.tag_name().name()));

    let parent_ns: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    for ns in node.namespaces() {
        if ns.name() == Some("xml") || parent_ns.contains(&(ns.name(), ns.uri())) {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        element.attributes.push((key, ns.uri().to_string()));
    }

    for attr in node.attributes() {
        let key = qualified(node, attr.namespace(), attr.name());
        element.attributes.push((key, attr.value().to_string()));
    }

    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    if !text.trim().is_empty() {
        element.text = Some(text.trim().to_string());
    }

    element.children = node
        .children()
        .filter(|c| c.is_element())
        .map(from_node)
        .collect();
    element
}

fn qualified(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nested_with_indent() {
        let root = XmlElement::new("a:root")
            .with_attr("xmlns:a", "urn:a")
            .with_child(XmlElement::new("a:leaf").with_attr("k", "v").with_text("5"))
            .with_child(XmlElement::new("a:empty"));

        let xml = root.to_xml_string(2).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("\n  <a:leaf k=\"v\">5</a:leaf>"));
        assert!(xml.contains("\n  <a:empty/>"));
        assert!(xml.ends_with("</a:root>\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = XmlElement::new("v").with_text("a < b & c").to_xml_string(2).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_parse_keeps_prefixes_and_declarations() {
        let text = r#"<?xml version="1.0"?>
<xbrli:xbrl xmlns:xbrli="urn:i" xmlns:bd-t="urn:t" xmlns:bd-i="urn:d">
  <bd-t:A>
    <bd-i:x contextRef="ctx1">5</bd-i:x>
  </bd-t:A>
</xbrli:xbrl>"#;

        let root = XmlElement::parse(text).unwrap();

        assert_eq!(root.name, "xbrli:xbrl");
        assert_eq!(root.attribute("xmlns:bd-t"), Some("urn:t"));
        let a = &root.children[0];
        assert_eq!(a.name, "bd-t:A");
        assert_eq!(a.text, None);
        assert!(a.attributes.is_empty());
        assert_eq!(a.children[0].text.as_deref(), Some("5"));
        assert_eq!(a.children[0].attribute("contextRef"), Some("ctx1"));
    }

    #[test]
    fn test_find_and_local_name() {
        let root = XmlElement::new("r").with_child(
            XmlElement::new("p:a").with_child(XmlElement::new("p:b").with_text("deep")),
        );

        let b = root.find("p:b").unwrap();
        assert_eq!(b.local_name(), "b");
        assert_eq!(b.text.as_deref(), Some("deep"));
        assert!(root.find("p:c").is_none());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(XmlElement::parse("<a><b></a>"), Err(XmlError::Parse(_))));
    }
}
