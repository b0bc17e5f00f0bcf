//! Results-export hook: canonical JSON plus a flat CSV quantile table.
//!
//! Downstream re-analysis needs the finalized numbers independently of the
//! rendered report; the schema is deliberately the result record itself.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use quake_core::errors::{ErrorInfo, QuakeError};

use crate::orchestrator::EvaluationOutput;
use crate::result::{EvaluationResult, ResultStatus};
use crate::serde::to_canonical_json_bytes;

fn io_error(code: &str, err: impl ToString, path: &Path) -> QuakeError {
    QuakeError::Serde(
        ErrorInfo::new(format!("quake_eval.{code}"), err.to_string())
            .with_context("path", path.display().to_string()),
    )
}

/// Writes the full evaluation output as canonical JSON.
pub fn write_results_json(path: &Path, output: &EvaluationOutput) -> Result<PathBuf, QuakeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error("results_dir", err, path))?;
    }
    let bytes = to_canonical_json_bytes(output)?;
    fs::write(path, bytes).map_err(|err| io_error("results_write", err, path))?;
    Ok(path.to_path_buf())
}

/// Writes a flat per-test quantile table as CSV.
pub fn write_results_csv(
    path: &Path,
    results: &IndexMap<String, EvaluationResult>,
) -> Result<PathBuf, QuakeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error("results_dir", err, path))?;
    }
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| io_error("results_csv_open", err, path))?;
    writer
        .write_record(["test", "status", "observed", "quantile"])
        .map_err(|err| io_error("results_csv_write", err, path))?;
    for row in results_table(results) {
        writer
            .write_record(&row)
            .map_err(|err| io_error("results_csv_write", err, path))?;
    }
    writer
        .flush()
        .map_err(|err| io_error("results_csv_flush", err, path))?;
    Ok(path.to_path_buf())
}

/// Builds the per-test summary table, one row per registered test.
pub fn results_table(results: &IndexMap<String, EvaluationResult>) -> Vec<Vec<String>> {
    results
        .iter()
        .map(|(name, result)| {
            let status = match &result.status {
                ResultStatus::Normal => "normal".to_string(),
                ResultStatus::Undefined { reason } => format!("undefined: {reason}"),
            };
            let observed = result
                .observed_statistic
                .map(|value| format!("{value:.6}"))
                .unwrap_or_default();
            let quantile = result
                .quantile
                .map(|value| format!("{value:.6}"))
                .unwrap_or_default();
            vec![name.clone(), status, observed, quantile]
        })
        .collect()
}
