//! Disk runners for every stage.
//!
//! Each runner reads its inputs, calls the matching pure transformation and
//! writes the results. Directory stages handle files one at a time, in file
//! name order; a file that fails is logged and skipped so the rest of the
//! directory still goes through.
//!
//! # Example
//!
//! ```rust,ignore
//! use xbrlpipe::config::PipelineConfig;
//! use xbrlpipe::transform::pipeline::{run_group, run_clean, run_combine};
//!
//! let config = PipelineConfig::default();
//! run_group(&config.grouper)?;
//! // ... augment ...
//! run_clean(&config.clean)?;
//! run_combine(&config.combine)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::combiner::combine;
use super::fence::FenceMatcher;
use super::grouper::{group_rows, to_artifacts};
use super::transpose::transpose;
use crate::ai::{augment_prompt, strip_outer_fence, TextGenerator, AUGMENT_INSTRUCTION};
use crate::config::{
    AugmentConfig, CleanConfig, CombineConfig, GrouperConfig, MfdConfig, TransposeConfig, XbrlConfig,
};
use crate::error::{PipelineError, PipelineResult, TableResult};
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::models::{Artifact, Table};
use crate::parser::{read_headed_csv, read_headerless_csv, read_text_auto, write_csv};
use crate::parser::workbook::{read_first_sheet_headed, read_sheet, write_sheets, write_table};
use crate::xbrl::assembler::assemble;
use crate::xbrl::mapper::map_value;
use crate::xbrl::mfd::assemble_mfd;

/// Files written and files left out by one stage run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub written: Vec<PathBuf>,
    /// Skipped inputs with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

impl StageReport {
    fn wrote(&mut self, path: PathBuf) {
        log_info_indent(format!("Wrote {}", path.display()), 1);
        self.written.push(path);
    }

    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        log_warning_indent(format!("Skipping {}: {}", display_name(path), reason), 1);
        self.skipped.push((path.to_path_buf(), reason));
    }
}

/// Arguments of the value mapper.
#[derive(Debug, Clone)]
pub struct MapRequest {
    pub xbrl: PathBuf,
    pub path: Vec<String>,
    pub target: String,
    pub value: String,
    /// Defaults to rewriting `xbrl` in place.
    pub output: Option<PathBuf>,
}

// =============================================================================
// Helpers
// =============================================================================

fn require_file(path: &Path) -> PipelineResult<()> {
    if !path.is_file() {
        log_error(format!("Input not found: {}", path.display()));
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    Ok(())
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub fn list_csv_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        log_error(format!("Input directory not found: {}", dir.display()));
        return Err(PipelineError::MissingInput(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn write_text(path: &Path, text: &str) -> std::io::Result<()> {
    ensure_parent(path)?;
    fs::write(path, text)
}

/// Read an annotated table: `.csv` with auto-detection, anything else as a
/// workbook whose first sheet row holds the column names.
fn read_annotated_table(path: &Path) -> TableResult<Table> {
    if has_extension(path, "csv") {
        let parsed = read_headed_csv(path)?;
        log_info_indent(
            format!("Encoding {}, delimiter '{}'", parsed.encoding, parsed.delimiter),
            1,
        );
        return Ok(parsed.table);
    }
    read_first_sheet_headed(path)
}

// =============================================================================
// Stages
// =============================================================================

/// Workbook → one headerless CSV per group.
pub fn run_group(config: &GrouperConfig) -> PipelineResult<StageReport> {
    log_info(format!("Grouping {} [{}]", config.input.display(), config.sheet));
    require_file(&config.input)?;

    let table = read_sheet(&config.input, &config.sheet, config.skip_rows)?;
    log_info_indent(format!("Read {} rows", table.len()), 1);

    let groups = group_rows(&table, &config.options());
    fs::create_dir_all(&config.output_dir)?;

    let mut report = StageReport::default();
    for artifact in to_artifacts(groups) {
        let path = config.output_dir.join(&artifact.name);
        write_csv(&path, &artifact.table)?;
        report.wrote(path);
    }

    log_success(format!(
        "{} group file(s) in {}",
        report.written.len(),
        config.output_dir.display()
    ));
    Ok(report)
}

/// Send every grouped CSV to the generator, one file at a time.
pub async fn run_augment<G: TextGenerator>(
    generator: &G,
    config: &AugmentConfig,
) -> PipelineResult<StageReport> {
    log_info(format!("Augmenting {}", config.input_dir.display()));
    let files = list_csv_files(&config.input_dir)?;
    fs::create_dir_all(&config.output_dir)?;

    let mut report = StageReport::default();
    for path in files {
        log_info(format!("Processing {}", display_name(&path)));

        let csv_text = match read_text_auto(&path) {
            Ok(text) => text,
            Err(e) => {
                report.skip(&path, e.to_string());
                continue;
            }
        };

        let reply = match generator.generate(&augment_prompt(AUGMENT_INSTRUCTION, &csv_text)).await {
            Ok(reply) => reply,
            Err(e) => {
                report.skip(&path, e.to_string());
                continue;
            }
        };

        let output = config.output_dir.join(display_name(&path));
        tokio::fs::write(&output, strip_outer_fence(&reply)).await?;
        report.wrote(output);
    }

    log_success(format!(
        "{} augmented, {} skipped",
        report.written.len(),
        report.skipped.len()
    ));
    Ok(report)
}

/// Keep only the fenced CSV block of every generated file.
pub fn run_clean(config: &CleanConfig) -> PipelineResult<StageReport> {
    log_info(format!("Cleaning {}", config.input_dir.display()));
    let files = list_csv_files(&config.input_dir)?;
    fs::create_dir_all(&config.output_dir)?;

    let matcher = FenceMatcher::language(&config.language);
    let mut report = StageReport::default();

    for path in files {
        let text = match read_text_auto(&path) {
            Ok(text) => text,
            Err(e) => {
                report.skip(&path, e.to_string());
                continue;
            }
        };

        match matcher.extract(&text) {
            Some(block) if !block.is_empty() => {
                let output = config.output_dir.join(display_name(&path));
                write_text(&output, &block)?;
                report.wrote(output);
            }
            Some(_) => report.skip(&path, "fenced block is empty"),
            None => report.skip(&path, format!("no {} block found", matcher.opener)),
        }
    }

    log_success(format!(
        "{} cleaned, {} without a block",
        report.written.len(),
        report.skipped.len()
    ));
    Ok(report)
}

/// Concatenate the cleaned CSVs into one workbook (or CSV).
pub fn run_combine(config: &CombineConfig) -> PipelineResult<StageReport> {
    log_info(format!("Combining {}", config.input_dir.display()));
    let files = list_csv_files(&config.input_dir)?;

    let mut report = StageReport::default();
    let mut artifacts = Vec::new();
    for path in files {
        match read_headerless_csv(&path) {
            Ok(table) => artifacts.push(Artifact::new(display_name(&path), table)),
            Err(e) => report.skip(&path, e.to_string()),
        }
    }

    let Some(table) = combine(&artifacts) else {
        log_error("No CSV files could be read, nothing written");
        return Err(PipelineError::NoArtifacts(config.input_dir.clone()));
    };

    ensure_parent(&config.output)?;
    if has_extension(&config.output, "csv") {
        write_csv(&config.output, &table)?;
    } else {
        write_table(&config.output, &config.sheet, &table)?;
    }
    report.wrote(config.output.clone());

    log_success(format!(
        "Combined {} file(s), {} rows",
        artifacts.len(),
        table.len()
    ));
    Ok(report)
}

/// Workbook → one sheet per path group, values laid out horizontally.
pub fn run_transpose(config: &TransposeConfig) -> PipelineResult<StageReport> {
    log_info(format!("Transposing {} [{}]", config.input.display(), config.sheet));
    require_file(&config.input)?;

    let table = read_sheet(&config.input, &config.sheet, config.skip_rows)?;
    let sheets = transpose(&table, &config.columns)?;
    if sheets.is_empty() {
        log_warning("No path groups found");
    }

    ensure_parent(&config.output)?;
    write_sheets(&config.output, &sheets)?;

    let mut report = StageReport::default();
    report.wrote(config.output.clone());
    log_success(format!("{} sheet(s)", sheets.len()));
    Ok(report)
}

/// Annotated table → XBRL instance.
pub fn run_xbrl(config: &XbrlConfig) -> PipelineResult<StageReport> {
    log_info(format!("Building XBRL from {}", config.input.display()));
    require_file(&config.input)?;

    let table = read_annotated_table(&config.input)?;
    let document = assemble(&table, &config.options())?;
    write_text(&config.output, &document.to_xml_string()?)?;

    let mut report = StageReport::default();
    for skipped in &document.skipped {
        report
            .skipped
            .push((config.input.clone(), format!("row {}: {}", skipped.index, skipped.error)));
    }
    report.wrote(config.output.clone());

    log_success(format!(
        "{} fact(s), {} row(s) skipped",
        document.fields,
        document.skipped.len()
    ));
    Ok(report)
}

/// XBRL instance → MapForce mapping.
pub fn run_mfd(config: &MfdConfig) -> PipelineResult<StageReport> {
    log_info(format!("Building mapping for {}", config.xbrl.display()));
    require_file(&config.xbrl)?;

    let xbrl = fs::read_to_string(&config.xbrl)?;
    let mapping = assemble_mfd(&xbrl, &config.xbrl.to_string_lossy())?;
    write_text(&config.output, &mapping.to_xml_string(4)?)?;

    let mut report = StageReport::default();
    report.wrote(config.output.clone());
    log_success(format!("Mapping written to {}", config.output.display()));
    Ok(report)
}

/// Set one value in an XBRL instance.
pub fn run_map(request: &MapRequest) -> PipelineResult<StageReport> {
    log_info(format!(
        "Mapping {} = {} under /{}",
        request.target,
        request.value,
        request.path.join("/")
    ));
    require_file(&request.xbrl)?;

    let xbrl = fs::read_to_string(&request.xbrl)?;
    let updated = map_value(&xbrl, &request.path, &request.target, &request.value)?;

    let output = request.output.clone().unwrap_or_else(|| request.xbrl.clone());
    write_text(&output, &updated)?;

    let mut report = StageReport::default();
    report.wrote(output);
    Ok(report)
}
