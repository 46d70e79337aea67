//! # CLI Commands
//!
//! The command implementations behind `detect run`, `detect inputs` and
//! `detect serve`, plus the model loader shared with the web mode.
//!
//! Commands return their results so integration tests can inspect them.
//! Apart from the size banner of `cmd_run`, printing is left to `main.rs`.

use crate::config::{MODEL_FILES, ServerConfig};
use crate::error::{AppError, AppResult};
use detect_core::{
    AvailableInput, CRITERIA_FILE, DetectModel, Diagnostics, Evaluation, ModelBuilder,
    REQUIREMENTS_FILE, SizeAssessment, criteria_csv, requirements_csv,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BANNER_WIDTH: usize = 40;

// =============================================================================
// MODEL LOADING
// =============================================================================

/// Read and merge the model documents under `dir`.
///
/// Files that cannot be read or parsed are reported in the diagnostics (and
/// logged) and loading continues with the rest. The CLI commands refuse a
/// model with error diagnostics; see [`load_model_strict`].
pub fn load_model(dir: &Path) -> (DetectModel, Diagnostics) {
    let mut builder = ModelBuilder::new();
    for file in MODEL_FILES {
        let path = dir.join(file);
        let source = path.display().to_string();
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                if builder.add_source(&source, &text) {
                    debug!(path = %source, "model document loaded");
                }
            }
            Err(e) => builder.report_error(&source, format!("failed to read model document: {e}")),
        }
    }

    let (model, diagnostics) = builder.build();
    info!(
        dir = %dir.display(),
        diagnostics = diagnostics.len(),
        "model loaded"
    );
    (model, diagnostics)
}

/// Load the model and fail on the first error diagnostic.
pub fn load_model_strict(dir: &Path) -> AppResult<DetectModel> {
    let (model, diagnostics) = load_model(dir);
    match diagnostics.errors().next() {
        Some(first) => Err(AppError::Load(first.clone())),
        None => Ok(model),
    }
}

// =============================================================================
// RUN
// =============================================================================

/// What a CLI run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub evaluation: Evaluation,
    pub requirements_path: PathBuf,
    pub criteria_path: PathBuf,
}

/// Classify the model's stored selection and write both CSV files.
///
/// The banner is printed as soon as the size is known, before the records
/// are filtered.
pub fn cmd_run(model_dir: &Path, output_dir: &Path) -> AppResult<RunOutput> {
    let model = load_model_strict(model_dir)?;

    let assessment = SizeAssessment::assess(&model, model.selections())?;
    println!("{}", banner(assessment.system_size.name()));

    let evaluation = Evaluation::for_assessment(&model, assessment)?;
    let (requirements_path, criteria_path) = write_csv_files(output_dir, &evaluation)?;

    Ok(RunOutput {
        evaluation,
        requirements_path,
        criteria_path,
    })
}

/// Write `requirements.csv` and `criteria.csv` into `dir`, creating it if needed.
pub fn write_csv_files(dir: &Path, evaluation: &Evaluation) -> AppResult<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;

    let requirements_path = dir.join(REQUIREMENTS_FILE);
    let bytes = requirements_csv(&evaluation.requirements)?;
    std::fs::write(&requirements_path, bytes).map_err(|e| AppError::io(&requirements_path, e))?;

    let criteria_path = dir.join(CRITERIA_FILE);
    let bytes = criteria_csv(&evaluation.criteria)?;
    std::fs::write(&criteria_path, bytes).map_err(|e| AppError::io(&criteria_path, e))?;

    info!(
        requirements = %requirements_path.display(),
        criteria = %criteria_path.display(),
        "CSV files written"
    );
    Ok((requirements_path, criteria_path))
}

/// The size banner, framed by two rules of `=`.
#[must_use]
pub fn banner(size: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("\n{rule}\n  System Size: {size}\n{rule}\n")
}

// =============================================================================
// INPUTS
// =============================================================================

/// The model's finished input fields with their weighted options.
pub fn cmd_inputs(model_dir: &Path) -> AppResult<Vec<AvailableInput>> {
    let model = load_model_strict(model_dir)?;
    Ok(model.available_inputs()?)
}

/// Render available inputs as JSON or as an indented listing.
pub fn render_inputs(inputs: &[AvailableInput], json: bool) -> AppResult<String> {
    if json {
        let mut out = serde_json::to_string_pretty(inputs)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for (i, input) in inputs.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, input.name);
        let _ = writeln!(out, "   {}", input.question);
        for option in &input.options {
            let _ = writeln!(out, "     [{:>3}] {}", option.value, option.label);
        }
    }
    Ok(out)
}

// =============================================================================
// SERVE
// =============================================================================

/// Start the web mode and block until shutdown.
pub async fn cmd_serve(config: ServerConfig) -> AppResult<()> {
    crate::api::serve(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_matches_console_format() {
        assert_eq!(
            banner("Medium"),
            "\n========================================\n  System Size: Medium\n========================================\n"
        );
    }
}
