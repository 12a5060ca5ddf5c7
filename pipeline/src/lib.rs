//! # xbrlpipe - spreadsheet to XBRL batch pipeline
//!
//! xbrlpipe turns a tax-data workbook into grouped CSV files, has a language
//! model fill in example values, collects the cleaned results into one
//! workbook, and assembles XBRL instances and MapForce mappings.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐
//! │ Workbook │──▶│ Grouper │──▶│ Augment │──▶│  Clean  │──▶│ Combiner │
//! │ (xlsx)   │   │ (csv/g) │   │ (LLM)   │   │ (fence) │   │ (xlsx)   │
//! └──────────┘   └─────────┘   └─────────┘   └─────────┘   └──────────┘
//!
//! ┌──────────┐   ┌─────────┐   ┌─────────┐
//! │ Annotated│──▶│  XBRL   │──▶│   MFD   │
//! │  table   │   │instance │   │ mapping │
//! └──────────┘   └─────────┘   └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xbrlpipe::{assemble, read_headed_csv, XbrlOptions};
//!
//! let parsed = read_headed_csv("annotated.csv")?;
//! let document = assemble(&parsed.table, &XbrlOptions::default())?;
//! std::fs::write("output.xbrl", document.to_xml_string()?)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Rows, tables, groups, qualified names
//! - [`parser`] - CSV and workbook reading and writing
//! - [`transform`] - Grouper, fence extractor, combiner, transposer, stage runners
//! - [`xbrl`] - XBRL instance, MFD mapping, value mapper
//! - [`ai`] - Text-generation client
//! - [`config`] - TOML pipeline configuration
//! - [`logs`] - Stage log broadcaster

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// XML output
pub mod xbrl;

// AI
pub mod ai;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{AiError, ConfigError, PipelineError, PipelineResult, TableError, XmlError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Artifact, Group, PathKeyedField, QName, Row, Table};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_headed,
    parse_headerless, read_headed_csv, read_headerless_csv, to_csv_string, write_csv, ParseResult,
};

// =============================================================================
// Re-exports - Transformations
// =============================================================================

pub use transform::{
    combine, extract_csv_block, group_rows, source_identifier, to_artifacts, transpose,
    FenceMatcher, GroupOptions, TransposeOptions,
};

// =============================================================================
// Re-exports - XBRL
// =============================================================================

pub use xbrl::{assemble, assemble_mfd, map_value, GroupingMode, XbrlDocument, XbrlOptions, XmlElement};

// =============================================================================
// Re-exports - AI Client
// =============================================================================

pub use ai::{GeminiClient, TextGenerator};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::PipelineConfig;
pub use transform::pipeline::{
    run_augment, run_clean, run_combine, run_group, run_map, run_mfd, run_transpose, run_xbrl,
    MapRequest, StageReport,
};
