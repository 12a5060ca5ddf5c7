//! XBRL instance and MapForce mapping output.
//!
//! - Namespaces: the prefix table shared by every writer
//! - Tree: a small owned element tree, written with quick-xml and read with roxmltree
//! - Assembler: annotated table to XBRL instance
//! - Mfd: XBRL instance to mapping definition
//! - Mapper: set one value in an existing instance

pub mod assembler;
pub mod mapper;
pub mod mfd;
pub mod namespaces;
pub mod tree;

pub use assembler::{assemble, GroupingMode, XbrlDocument, XbrlOptions};
pub use mapper::map_value;
pub use mfd::assemble_mfd;
pub use namespaces::NamespaceTable;
pub use tree::XmlElement;
