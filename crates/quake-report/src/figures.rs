use std::fs;
use std::path::{Path, PathBuf};

use quake_core::errors::{ErrorInfo, QuakeError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureConfig {
    pub width: u32,
    pub height: u32,
    pub bins: usize,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 240,
            bins: 24,
        }
    }
}

/// Quantile band series sampled at shared x positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSeries {
    pub q05: Vec<f64>,
    pub q25: Vec<f64>,
    pub q50: Vec<f64>,
    pub q75: Vec<f64>,
    pub q95: Vec<f64>,
}

fn svg_open(config: &FigureConfig) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{w}' height='{h}'>",
        w = config.width,
        h = config.height
    )
}

/// Renders a histogram of raw values with an optional observed-value marker.
pub fn render_histogram_svg(values: &[f64], observed: Option<f64>, config: &FigureConfig) -> String {
    if values.is_empty() {
        return format!("{}</svg>", svg_open(config));
    }
    let mut min = values
        .iter()
        .cloned()
        .fold(f64::INFINITY, |acc, val| acc.min(val));
    let mut max = values
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, |acc, val| acc.max(val));
    if let Some(marker) = observed {
        min = min.min(marker);
        max = max.max(marker);
    }
    let bin_count = config.bins.max(1);
    let span = (max - min).max(1e-9);
    let mut bins = vec![0usize; bin_count];
    for value in values {
        let mut idx = ((value - min) / span * bin_count as f64).floor() as usize;
        if idx >= bin_count {
            idx = bin_count - 1;
        }
        bins[idx] += 1;
    }
    let max_bin = bins.iter().copied().max().unwrap_or(1).max(1) as f64;
    let bar_width = config.width as f64 / bin_count as f64;
    let mut parts = vec![svg_open(config)];
    for (idx, count) in bins.iter().enumerate() {
        let height = (*count as f64 / max_bin) * config.height as f64;
        let x = bar_width * idx as f64;
        let y = config.height as f64 - height;
        parts.push(format!(
            "<rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' fill='#3b82f6' />",
            x,
            y,
            bar_width.max(1.0),
            height
        ));
    }
    if let Some(marker) = observed {
        let x = (marker - min) / span * config.width as f64;
        parts.push(format!(
            "<line x1='{x:.2}' y1='0' x2='{x:.2}' y2='{h}' stroke='#dc2626' stroke-width='2' />",
            x = x,
            h = config.height
        ));
    }
    parts.push("</svg>".into());
    parts.join("")
}

/// Renders side-by-side expected/observed bars over shared bin edges.
pub fn render_paired_bars_svg(
    edges: &[f64],
    expected: &[f64],
    observed: &[f64],
    config: &FigureConfig,
) -> String {
    let bin_count = expected.len().min(observed.len());
    if bin_count == 0 || edges.len() < 2 {
        return format!("{}</svg>", svg_open(config));
    }
    let max_value = expected
        .iter()
        .chain(observed.iter())
        .cloned()
        .fold(0.0f64, f64::max)
        .max(1e-9);
    let slot_width = config.width as f64 / bin_count as f64;
    let bar_width = (slot_width / 2.0).max(1.0);
    let mut parts = vec![svg_open(config)];
    for idx in 0..bin_count {
        let expected_height = expected[idx] / max_value * config.height as f64;
        let observed_height = observed[idx] / max_value * config.height as f64;
        let x = slot_width * idx as f64;
        parts.push(format!(
            "<rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' fill='#3b82f6' />",
            x,
            config.height as f64 - expected_height,
            bar_width,
            expected_height
        ));
        parts.push(format!(
            "<rect x='{:.2}' y='{:.2}' width='{:.2}' height='{:.2}' fill='#dc2626' />",
            x + bar_width,
            config.height as f64 - observed_height,
            bar_width,
            observed_height
        ));
    }
    parts.push("</svg>".into());
    parts.join("")
}

/// Renders quantile band polylines with the observed curve on top.
pub fn render_quantile_band_svg(
    xs: &[f64],
    bands: &BandSeries,
    observed: &[f64],
    config: &FigureConfig,
) -> String {
    if xs.len() < 2 {
        return format!("{}</svg>", svg_open(config));
    }
    let y_max = bands
        .q95
        .iter()
        .chain(observed.iter())
        .cloned()
        .fold(0.0f64, f64::max)
        .max(1e-9);
    let x_min = xs[0];
    let x_span = (xs[xs.len() - 1] - x_min).max(1e-9);
    let project = |x: f64, y: f64| -> (f64, f64) {
        (
            (x - x_min) / x_span * config.width as f64,
            config.height as f64 * (1.0 - y / y_max),
        )
    };
    let polyline = |ys: &[f64], stroke: &str, width: u32| -> String {
        let points: Vec<String> = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| {
                let (px, py) = project(x, y);
                format!("{px:.2},{py:.2}")
            })
            .collect();
        format!(
            "<polyline points='{}' fill='none' stroke='{}' stroke-width='{}' />",
            points.join(" "),
            stroke,
            width
        )
    };
    let mut parts = vec![svg_open(config)];
    parts.push(polyline(&bands.q05, "#bfdbfe", 1));
    parts.push(polyline(&bands.q25, "#93c5fd", 1));
    parts.push(polyline(&bands.q50, "#3b82f6", 2));
    parts.push(polyline(&bands.q75, "#93c5fd", 1));
    parts.push(polyline(&bands.q95, "#bfdbfe", 1));
    if observed.len() == xs.len() {
        parts.push(polyline(observed, "#dc2626", 2));
    }
    parts.push("</svg>".into());
    parts.join("")
}

/// Renders a gridded rate field as shaded cells with observed-event dots.
///
/// Cells arrive as `(longitude, latitude, value)` centers; shading is log
/// scaled so low-rate cells stay visible next to the aftershock core.
pub fn render_rate_grid_svg(
    cells: &[(f64, f64, f64)],
    events: &[(f64, f64)],
    cell_size_deg: f64,
    config: &FigureConfig,
) -> String {
    if cells.is_empty() {
        return format!("{}</svg>", svg_open(config));
    }
    let lon_min = cells.iter().map(|c| c.0).fold(f64::INFINITY, f64::min) - cell_size_deg;
    let lon_max = cells.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max) + cell_size_deg;
    let lat_min = cells.iter().map(|c| c.1).fold(f64::INFINITY, f64::min) - cell_size_deg;
    let lat_max = cells.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max) + cell_size_deg;
    let lon_span = (lon_max - lon_min).max(1e-9);
    let lat_span = (lat_max - lat_min).max(1e-9);
    let scale = |value: f64, max_log: f64| -> f64 {
        if value <= 0.0 || max_log <= 0.0 {
            0.0
        } else {
            ((1.0 + value).ln() / max_log).clamp(0.0, 1.0)
        }
    };
    let max_log = cells
        .iter()
        .map(|c| (1.0 + c.2.max(0.0)).ln())
        .fold(0.0f64, f64::max);
    let cell_w = cell_size_deg / lon_span * config.width as f64;
    let cell_h = cell_size_deg / lat_span * config.height as f64;
    let mut parts = vec![svg_open(config)];
    for &(lon, lat, value) in cells {
        let shade = scale(value, max_log);
        let x = (lon - cell_size_deg / 2.0 - lon_min) / lon_span * config.width as f64;
        let y = (lat_max - lat - cell_size_deg / 2.0) / lat_span * config.height as f64;
        let intensity = (255.0 - shade * 200.0) as u32;
        parts.push(format!(
            "<rect x='{x:.2}' y='{y:.2}' width='{w:.2}' height='{h:.2}' fill='rgb({i},{i},255)' />",
            x = x,
            y = y,
            w = cell_w.max(1.0),
            h = cell_h.max(1.0),
            i = intensity
        ));
    }
    for &(lon, lat) in events {
        let x = (lon - lon_min) / lon_span * config.width as f64;
        let y = (lat_max - lat) / lat_span * config.height as f64;
        parts.push(format!(
            "<circle cx='{x:.2}' cy='{y:.2}' r='2' fill='#dc2626' />"
        ));
    }
    parts.push("</svg>".into());
    parts.join("")
}

/// Writes a rendered SVG document to disk, creating parent directories.
pub fn write_svg(path: &Path, svg: &str) -> Result<PathBuf, QuakeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| io_error("figure_dir", err, path))?;
    }
    fs::write(path, svg).map_err(|err| io_error("figure_write", err, path))?;
    Ok(path.to_path_buf())
}

fn io_error(code: &str, err: impl ToString, path: &Path) -> QuakeError {
    QuakeError::Report(
        ErrorInfo::new(format!("quake_report.{code}"), err.to_string())
            .with_context("path", path.display().to_string()),
    )
}
