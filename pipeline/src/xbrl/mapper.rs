//! Write a single value into an existing XBRL instance.
//!
//! The element is addressed by a path of child names from the root, then a
//! target name searched among the descendants of the last path element.
//! Names match on the full `prefix:local` form or on the local part alone.

use super::tree::XmlElement;
use crate::error::{XmlError, XmlResult};

fn matches(element: &XmlElement, name: &str) -> bool {
    if element.name == name {
        return true;
    }
    let local = name.split_once(':').map(|(_, l)| l).unwrap_or(name);
    element.local_name() == local
}

fn find_descendant_mut<'a>(element: &'a mut XmlElement, name: &str) -> Option<&'a mut XmlElement> {
    for child in element.children.iter_mut() {
        if matches(child, name) {
            return Some(child);
        }
        if let Some(found) = find_descendant_mut(child, name) {
            return Some(found);
        }
    }
    None
}

/// Set the text of `target` below `path` in the tree.
pub fn map_value_in(root: &mut XmlElement, path: &[String], target: &str, value: &str) -> XmlResult<()> {
    let mut current = root;
    for part in path {
        current = current
            .children
            .iter_mut()
            .find(|c| matches(c, part))
            .ok_or_else(|| XmlError::PathNotFound(part.clone()))?;
    }

    let node = find_descendant_mut(current, target)
        .ok_or_else(|| XmlError::TargetNotFound(target.to_string()))?;
    node.text = Some(value.to_string());
    Ok(())
}

/// Parse `xbrl`, set one value, and serialize the result.
pub fn map_value(xbrl: &str, path: &[String], target: &str, value: &str) -> XmlResult<String> {
    let mut root = XmlElement::parse(xbrl)?;
    map_value_in(&mut root, path, target, value)?;
    root.to_xml_string(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTANCE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:bd-t="urn:t" xmlns:bd-i="urn:d">
  <bd-t:BusinessSpecification>
    <bd-t:Shares>
      <bd-i:SubstantialInterestSharesCapitalCommon contextRef="ctx1">0</bd-i:SubstantialInterestSharesCapitalCommon>
    </bd-t:Shares>
  </bd-t:BusinessSpecification>
</xbrli:xbrl>"#;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_maps_value_by_local_target_name() {
        let out = map_value(
            INSTANCE,
            &path(&["bd-t:BusinessSpecification"]),
            "SubstantialInterestSharesCapitalCommon",
            "1772594",
        )
        .unwrap();

        let root = XmlElement::parse(&out).unwrap();
        let node = root.find("bd-i:SubstantialInterestSharesCapitalCommon").unwrap();
        assert_eq!(node.text.as_deref(), Some("1772594"));
        assert_eq!(node.attribute("contextRef"), Some("ctx1"));
        assert_eq!(root.attribute("xmlns:bd-i"), Some("urn:d"));
    }

    #[test]
    fn test_path_matches_local_part() {
        let mut root = XmlElement::parse(INSTANCE).unwrap();
        map_value_in(
            &mut root,
            &path(&["other:BusinessSpecification", "Shares"]),
            "bd-i:SubstantialInterestSharesCapitalCommon",
            "5",
        )
        .unwrap();

        assert_eq!(
            root.find("bd-i:SubstantialInterestSharesCapitalCommon").unwrap().text.as_deref(),
            Some("5")
        );
    }

    #[test]
    fn test_missing_path_component() {
        let result = map_value(INSTANCE, &path(&["bd-t:Nope"]), "x", "1");
        assert!(matches!(result, Err(XmlError::PathNotFound(p)) if p == "bd-t:Nope"));
    }

    #[test]
    fn test_missing_target() {
        let result = map_value(INSTANCE, &path(&["bd-t:BusinessSpecification"]), "Nope", "1");
        assert!(matches!(result, Err(XmlError::TargetNotFound(t)) if t == "Nope"));
    }
}
