//! Renders the figure payloads embedded in finalized results.

use std::path::{Path, PathBuf};

use quake_core::errors::QuakeError;
use quake_report::figures::{
    render_histogram_svg, render_paired_bars_svg, render_quantile_band_svg, render_rate_grid_svg,
    write_svg, FigureConfig,
};

use crate::result::{EvaluationResult, FigureData};

/// Writes every figure carried by a defined result under `out_dir`.
///
/// Undefined results render nothing and return no artifacts; rendering
/// depends only on the result, never on accumulator internals.
pub(crate) fn render_result(
    result: &EvaluationResult,
    out_dir: &Path,
    _show: bool,
) -> Result<Vec<PathBuf>, QuakeError> {
    if !result.is_defined() {
        return Ok(Vec::new());
    }
    let config = FigureConfig::default();
    let mut artifacts = Vec::with_capacity(result.figures.len());
    for figure in &result.figures {
        let svg = match &figure.data {
            FigureData::Histogram { values, observed } => {
                render_histogram_svg(values, *observed, &config)
            }
            FigureData::PairedBars {
                edges,
                expected,
                observed,
            } => render_paired_bars_svg(edges, expected, observed, &config),
            FigureData::QuantileBand {
                xs,
                bands,
                observed,
            } => render_quantile_band_svg(xs, bands, observed, &config),
            FigureData::RateGrid {
                cells,
                events,
                cell_size_deg,
            } => render_rate_grid_svg(cells, events, *cell_size_deg, &config),
        };
        let path = out_dir.join(format!("{}.svg", figure.name));
        artifacts.push(write_svg(&path, &svg)?);
    }
    Ok(artifacts)
}
