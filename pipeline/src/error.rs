//! Error types for the xbrlpipe stages.
//!
//! - [`TableError`] - CSV / workbook reading and writing
//! - [`AiError`] - text-generation service client
//! - [`XmlError`] - qualified names, XML building, parsing and mapping
//! - [`ConfigError`] - TOML configuration loading
//! - [`PipelineError`] - stage runners (top level)
//!
//! Conversions are `#[from]`, so `?` works across stage boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Table Errors
// =============================================================================

/// Errors while reading or writing tabular data.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid CSV content.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Workbook could not be opened, read or saved.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Requested sheet does not exist in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Named column missing from a headed table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Input had no rows.
    #[error("Table is empty")]
    Empty,
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
        TableError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

impl From<calamine::Error> for TableError {
    fn from(err: calamine::Error) -> Self {
        TableError::Workbook(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for TableError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        TableError::Workbook(err.to_string())
    }
}

// =============================================================================
// AI Client Errors
// =============================================================================

/// Errors from the text-generation client.
#[derive(Debug, Error)]
pub enum AiError {
    /// Missing API key.
    #[error("Missing API key: {0} not set")]
    MissingApiKey(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// Service answered with an error status.
    #[error("API error: {0}")]
    ApiError(String),

    /// Reply could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::RequestFailed(err.to_string())
    }
}

// =============================================================================
// XML Errors
// =============================================================================

/// Errors while building, parsing or editing XML documents.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Not of the form `prefix:local`.
    #[error("Invalid qualified name: '{0}'")]
    InvalidQName(String),

    /// Prefix absent from the namespace table.
    #[error("Unknown namespace prefix: '{0}'")]
    UnknownPrefix(String),

    /// Serialization failed.
    #[error("XML write error: {0}")]
    Write(String),

    /// Source document is not well-formed.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// A path component has no matching child element.
    #[error("Path component not found: {0}")]
    PathNotFound(String),

    /// The target element has no match below the resolved path.
    #[error("Target element not found: {0}")]
    TargetNotFound(String),
}

impl From<roxmltree::Error> for XmlError {
    fn from(err: roxmltree::Error) -> Self {
        XmlError::Parse(err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid TOML.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered.
    #[error("Cannot render config: {0}")]
    Render(#[from] toml::ser::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Stage runner errors.
///
/// Returned by the runners in [`crate::transform::pipeline`]; wraps the
/// lower-level errors and adds stage-level variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Table error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Text-generation error.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// XML error.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error outside table handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stage input does not exist.
    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// No artifact could be parsed, nothing was written.
    #[error("No parseable artifacts in {}", .0.display())]
    NoArtifacts(PathBuf),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for AI operations.
pub type AiResult<T> = Result<T, AiError>;

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for stage runners.
pub type PipelineResult<T> = Result<T, PipelineError>;
