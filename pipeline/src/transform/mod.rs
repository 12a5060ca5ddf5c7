//! Table-level stages.
//!
//! This module holds the pure transformations and their disk runners:
//! - Grouper: spreadsheet rows to per-group CSV artifacts
//! - Fence: fenced CSV block extraction from generated text
//! - Combiner: cleaned artifacts to one source-tagged table
//! - Transpose: path groups laid out horizontally, one sheet each
//! - Pipeline: directory and file runners for every stage

pub mod combiner;
pub mod fence;
pub mod grouper;
pub mod pipeline;
pub mod transpose;

pub use combiner::{combine, source_identifier};
pub use fence::{extract_csv_block, FenceMatcher};
pub use grouper::{group_rows, to_artifacts, GroupOptions};
pub use transpose::{transpose, TransposeOptions};
