//! Figure rendering and report assembly for forecast evaluations.

pub mod document;
pub mod figures;

pub use document::ReportBuilder;
pub use figures::{
    render_histogram_svg, render_paired_bars_svg, render_quantile_band_svg, render_rate_grid_svg,
    write_svg, BandSeries, FigureConfig,
};
