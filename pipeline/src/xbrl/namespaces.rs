//! Closed namespace table of the Dutch tax taxonomy (NT18) instances.
//!
//! Every element the XBRL assembler emits must resolve its prefix here.

use crate::error::{XmlError, XmlResult};
use crate::models::QName;

pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";

/// Entry point schema referenced by generated instances.
pub const DEFAULT_SCHEMA_URL: &str =
    "http://www.nltaxonomie.nl/nt18/bd/20240221/entrypoints/bd-rpt-erf-aangifte-2024.xsd";

/// Identifier of the single context of a generated instance.
pub const DEFAULT_CONTEXT_ID: &str = "ctx1";

/// `(prefix, uri)` pairs, in declaration order.
pub const NAMESPACES: &[(&str, &str)] = &[
    ("xbrli", XBRLI),
    ("link", LINK),
    ("bd-t", "http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-tuples"),
    ("bd-i", "http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-data"),
    ("bd-i-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-data-ext1"),
    ("nl-cd", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/nl-common-data"),
    ("bd-t-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-tuples-ext1"),
    ("iso4217", "http://www.xbrl.org/2003/iso4217"),
    ("xlink", XLINK),
    ("sbr", "http://www.nltaxonomie.nl/2011/xbrl/xbrl-syntax-extension"),
    ("sbr-dim", "http://www.nltaxonomie.nl/2013/xbrl/sbr-dimensional-concepts"),
    ("bd-codes", "http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-codes"),
    ("bd-types", "http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-types"),
    ("bd-abstr", "http://www.nltaxonomie.nl/nt18/bd/20231213/presentation/bd-abstracts"),
    ("bd-codes-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-codes-ext1"),
    ("bd-types-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/dictionary/bd-types-ext1"),
    ("bd-rpt-erf", "http://www.nltaxonomie.nl/nt18/bd/20240221/entrypoints/bd-rpt-erf-aangifte-2024"),
    ("bd-abstr-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/presentation/bd-abstr-ext1"),
    ("bd-lr-pre-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/presentation/bd-linkroles-pre-ext1"),
    ("bd-lr-hd-ext1", "http://www.nltaxonomie.nl/nt18/bd/20240221/validation/bd-linkroles-tables-ext1"),
    ("iso3166-enum-sbr", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/iso3166-countrycodes-2022-11-29"),
    ("iso4217-enum-sbr", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/iso4217-currencycodes-2023-01-01"),
    ("nl-codes", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/nl-codes"),
    ("nl-types", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/nl-types"),
    ("sbi", "http://www.nltaxonomie.nl/nt18/sbr/20230301/dictionary/sbi-businesscodes-2022"),
    ("xl", "http://www.xbrl.org/2003/XLink"),
    ("dtr-types", "http://www.xbrl.org/dtr/type/2020-01-21"),
    ("xbrldt", "http://xbrl.org/2005/xbrldt"),
    ("gen", "http://xbrl.org/2008/generic"),
    ("label", "http://xbrl.org/2008/label"),
];

/// Prefix → URI lookup over a fixed table.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceTable {
    entries: &'static [(&'static str, &'static str)],
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NamespaceTable {
    pub const fn builtin() -> Self {
        Self {
            entries: NAMESPACES,
        }
    }

    pub fn uri(&self, prefix: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| *uri)
    }

    /// Fail with [`XmlError::UnknownPrefix`] unless the prefix is declared.
    pub fn resolve(&self, name: &QName) -> XmlResult<&'static str> {
        self.uri(&name.prefix)
            .ok_or_else(|| XmlError::UnknownPrefix(name.prefix.clone()))
    }

    /// `xmlns:prefix` declarations for the document root.
    pub fn declarations(&self) -> impl Iterator<Item = (String, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|(prefix, uri)| (format!("xmlns:{}", prefix), *uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_prefix() {
        let table = NamespaceTable::builtin();
        let name = QName::parse("bd-i:x").unwrap();
        assert_eq!(
            table.resolve(&name).unwrap(),
            "http://www.nltaxonomie.nl/nt18/bd/20231213/dictionary/bd-data"
        );
    }

    #[test]
    fn test_unknown_prefix() {
        let table = NamespaceTable::builtin();
        let name = QName::parse("zz:x").unwrap();
        assert!(matches!(table.resolve(&name), Err(XmlError::UnknownPrefix(p)) if p == "zz"));
    }

    #[test]
    fn test_prefixes_unique() {
        let mut prefixes: Vec<&str> = NAMESPACES.iter().map(|(p, _)| *p).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), NAMESPACES.len());
    }
}
