//! Immutable evaluation results produced by the finalize phase.

use std::collections::BTreeMap;
use std::path::PathBuf;

use quake_report::figures::BandSeries;
use serde::{Deserialize, Serialize};

/// Outcome state of a finalized test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ResultStatus {
    /// The test produced a usable statistic or diagnostic.
    Normal,
    /// The test could not produce a statistic.
    ///
    /// Undefined results are clearly flagged rather than fabricated: a test
    /// evaluated over zero catalogs, or against a degenerate distribution,
    /// reports the reason here and is skipped by the plotting step.
    Undefined {
        /// Why the statistic is undefined.
        reason: String,
    },
}

/// Figure payload embedded in a result so that plotting needs no access to
/// accumulator internals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FigureData {
    /// Raw values binned at render time, with an optional observed marker.
    Histogram {
        /// Values to bin.
        values: Vec<f64>,
        /// Observed-value marker position.
        observed: Option<f64>,
    },
    /// Pre-binned expected/observed bars over shared edges.
    PairedBars {
        /// Shared bin edges.
        edges: Vec<f64>,
        /// Expected (ensemble) bar heights.
        expected: Vec<f64>,
        /// Observed bar heights.
        observed: Vec<f64>,
    },
    /// Ensemble quantile band curves with the observed curve overlaid.
    QuantileBand {
        /// Shared x positions.
        xs: Vec<f64>,
        /// Quantile band series.
        bands: BandSeries,
        /// Observed curve sampled at `xs`.
        observed: Vec<f64>,
    },
    /// Gridded rate field with observed-event overlay.
    RateGrid {
        /// Cell centers and values as `(lon, lat, value)`.
        cells: Vec<(f64, f64, f64)>,
        /// Observed epicenters as `(lon, lat)`.
        events: Vec<(f64, f64)>,
        /// Cell size in decimal degrees.
        cell_size_deg: f64,
    },
}

/// A named figure carried by a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedFigure {
    /// File stem used when the figure is rendered.
    pub name: String,
    /// Figure payload.
    pub data: FigureData,
}

/// Immutable record produced once per test by `evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Canonical test name.
    pub test_name: String,
    /// Outcome state.
    pub status: ResultStatus,
    /// Statistic computed from the observed catalog, when defined.
    pub observed_statistic: Option<f64>,
    /// Fraction of ensemble statistics at or below the observed value.
    pub quantile: Option<f64>,
    /// Auxiliary named quantiles for tests reporting more than one branch.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_quantiles: BTreeMap<String, f64>,
    /// Sorted empirical distribution underlying the quantile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<f64>,
    /// Figures to render for the report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub figures: Vec<NamedFigure>,
    /// Artifact paths filled in by the plotting step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
}

impl EvaluationResult {
    /// Creates an empty normal result for the given test.
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            status: ResultStatus::Normal,
            observed_statistic: None,
            quantile: None,
            named_quantiles: BTreeMap::new(),
            distribution: Vec::new(),
            figures: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Creates a clearly flagged undefined result.
    pub fn undefined(test_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Undefined {
                reason: reason.into(),
            },
            ..Self::new(test_name)
        }
    }

    /// Returns true when the result carries a usable outcome.
    pub fn is_defined(&self) -> bool {
        matches!(self.status, ResultStatus::Normal)
    }

    /// Returns a copy of the result with artifact paths attached.
    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }
}
