//! Pipeline configuration.
//!
//! Read from a TOML file with one section per stage. Every field has a
//! default, so an empty file (or no file at all) reproduces the stock
//! file layout. CLI flags override config values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_MODEL;
use crate::error::{ConfigError, ConfigResult};
use crate::transform::grouper::GroupOptions;
use crate::transform::transpose::TransposeOptions;
use crate::xbrl::assembler::{GroupingMode, XbrlOptions};
use crate::xbrl::namespaces::{DEFAULT_CONTEXT_ID, DEFAULT_SCHEMA_URL};

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "xbrlpipe.toml";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Top-level config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub grouper: GrouperConfig,

    #[serde(default)]
    pub augment: AugmentConfig,

    #[serde(default)]
    pub clean: CleanConfig,

    #[serde(default)]
    pub combine: CombineConfig,

    #[serde(default)]
    pub transpose: TransposeConfig,

    #[serde(default)]
    pub xbrl: XbrlConfig,

    #[serde(default)]
    pub mfd: MfdConfig,
}

/// `[grouper]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrouperConfig {
    /// Source workbook.
    #[serde(default = "default_workbook")]
    pub input: PathBuf,

    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Leading rows to ignore (the header row).
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,

    /// Zero-based key columns.
    #[serde(default = "default_key_columns")]
    pub key_columns: Vec<usize>,

    /// Zero-based sort column.
    #[serde(default = "default_sort_column")]
    pub sort_column: Option<usize>,

    #[serde(default = "default_grouped_dir")]
    pub output_dir: PathBuf,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            input: default_workbook(),
            sheet: default_sheet(),
            skip_rows: default_skip_rows(),
            key_columns: default_key_columns(),
            sort_column: default_sort_column(),
            output_dir: default_grouped_dir(),
        }
    }
}

impl GrouperConfig {
    pub fn options(&self) -> GroupOptions {
        GroupOptions {
            key_columns: self.key_columns.clone(),
            sort_column: self.sort_column,
        }
    }
}

fn default_workbook() -> PathBuf {
    "LibE2025dev.xlsx".into()
}
fn default_sheet() -> String {
    "Processed".into()
}
fn default_skip_rows() -> usize {
    1
}
fn default_key_columns() -> Vec<usize> {
    vec![2]
}
fn default_sort_column() -> Option<usize> {
    Some(10)
}
fn default_grouped_dir() -> PathBuf {
    "grouped_csvs".into()
}

/// `[augment]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    #[serde(default = "default_grouped_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_generated_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            input_dir: default_grouped_dir(),
            output_dir: default_generated_dir(),
            model: default_model(),
        }
    }
}

fn default_generated_dir() -> PathBuf {
    "gemini_output".into()
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}

/// `[clean]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanConfig {
    #[serde(default = "default_generated_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_cleaned_dir")]
    pub output_dir: PathBuf,

    /// Language tag of the fenced block to extract.
    #[serde(default = "default_fence_language")]
    pub language: String,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            input_dir: default_generated_dir(),
            output_dir: default_cleaned_dir(),
            language: default_fence_language(),
        }
    }
}

fn default_cleaned_dir() -> PathBuf {
    "cleaned_csv".into()
}
fn default_fence_language() -> String {
    "csv".into()
}

/// `[combine]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineConfig {
    #[serde(default = "default_cleaned_dir")]
    pub input_dir: PathBuf,

    /// `.xlsx` output, or `.csv` when the extension says so.
    #[serde(default = "default_combined")]
    pub output: PathBuf,

    #[serde(default = "default_combined_sheet")]
    pub sheet: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            input_dir: default_cleaned_dir(),
            output: default_combined(),
            sheet: default_combined_sheet(),
        }
    }
}

fn default_combined() -> PathBuf {
    "combined.xlsx".into()
}
fn default_combined_sheet() -> String {
    "Combined".into()
}

/// `[transpose]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransposeConfig {
    #[serde(default = "default_workbook")]
    pub input: PathBuf,

    #[serde(default = "default_sheet")]
    pub sheet: String,

    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,

    #[serde(default = "default_transposed")]
    pub output: PathBuf,

    #[serde(default)]
    pub columns: TransposeOptions,
}

impl Default for TransposeConfig {
    fn default() -> Self {
        Self {
            input: default_workbook(),
            sheet: default_sheet(),
            skip_rows: default_skip_rows(),
            output: default_transposed(),
            columns: TransposeOptions::default(),
        }
    }
}

fn default_transposed() -> PathBuf {
    "grouped_output_with_values_compact.xlsx".into()
}

/// `[xbrl]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbrlConfig {
    /// Annotated table: `.xlsx` or `.csv` with `ID`, `path1`, `field`, `value`.
    #[serde(default = "default_xbrl_input")]
    pub input: PathBuf,

    #[serde(default = "default_instance")]
    pub output: PathBuf,

    #[serde(default = "default_schema_url")]
    pub schema_url: String,

    #[serde(default = "default_context_id")]
    pub context_id: String,

    #[serde(default)]
    pub grouping: GroupingMode,
}

impl Default for XbrlConfig {
    fn default() -> Self {
        Self {
            input: default_xbrl_input(),
            output: default_instance(),
            schema_url: default_schema_url(),
            context_id: default_context_id(),
            grouping: GroupingMode::default(),
        }
    }
}

impl XbrlConfig {
    pub fn options(&self) -> XbrlOptions {
        XbrlOptions {
            schema_url: self.schema_url.clone(),
            context_id: self.context_id.clone(),
            grouping: self.grouping,
        }
    }
}

fn default_xbrl_input() -> PathBuf {
    "xbrl_input.xlsx".into()
}
fn default_instance() -> PathBuf {
    "output.xbrl".into()
}
fn default_schema_url() -> String {
    DEFAULT_SCHEMA_URL.into()
}
fn default_context_id() -> String {
    DEFAULT_CONTEXT_ID.into()
}

/// `[mfd]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfdConfig {
    #[serde(default = "default_instance")]
    pub xbrl: PathBuf,

    #[serde(default = "default_mapping")]
    pub output: PathBuf,
}

impl Default for MfdConfig {
    fn default() -> Self {
        Self {
            xbrl: default_instance(),
            output: default_mapping(),
        }
    }
}

fn default_mapping() -> PathBuf {
    "output.mfd".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl PipelineConfig {
    /// Load a config file. Missing sections and fields take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` when given, else `xbrlpipe.toml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            return Self::load(fallback);
        }

        tracing::debug!("config file not found, using defaults");
        Ok(Self::default())
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_layout() {
        let config = PipelineConfig::default();

        assert_eq!(config.grouper.input, PathBuf::from("LibE2025dev.xlsx"));
        assert_eq!(config.grouper.sheet, "Processed");
        assert_eq!(config.grouper.options(), GroupOptions::default());
        assert_eq!(config.augment.input_dir, config.grouper.output_dir);
        assert_eq!(config.clean.input_dir, config.augment.output_dir);
        assert_eq!(config.combine.input_dir, config.clean.output_dir);
        assert_eq!(config.mfd.xbrl, config.xbrl.output);
        assert_eq!(config.xbrl.options(), XbrlOptions::default());
        assert_eq!(config.augment.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[grouper]
sheet = "Raw"
key_columns = [2, 3]

[xbrl]
grouping = "split-by-id"
"#,
        )
        .unwrap();

        assert_eq!(config.grouper.sheet, "Raw");
        assert_eq!(config.grouper.key_columns, vec![2, 3]);
        assert_eq!(config.grouper.skip_rows, 1);
        assert_eq!(config.xbrl.grouping, GroupingMode::SplitById);
        assert_eq!(config.combine, CombineConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = PipelineConfig::from_toml("[grouper\nsheet = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rendered_config_reloads() {
        let config = PipelineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[combine]"));
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
