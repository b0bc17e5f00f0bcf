//! Plot-producing diagnostic accumulators.
//!
//! These follow the same two-phase contract as the consistency tests but
//! finalize into figures rather than quantiles. The magnitude histogram and
//! the two rate-field plots are usually constructed in pass-through mode
//! (`calc = false`) and receive their accumulation from the m-test or the
//! l-test through the orchestrator's shared-state wiring.

use quake_core::catalog::Catalog;
use quake_core::errors::{ErrorInfo, QuakeError};
use quake_core::region::GriddedRegion;
use quake_report::figures::BandSeries;

use crate::accumulator::{CatalogAccumulator, RunMetadata};
use crate::result::{EvaluationResult, FigureData, NamedFigure};
use crate::share::{MagnitudeAccumulation, RateGridAccumulation, ShareTag, SharedData};
use crate::stat::{percentile, sorted};

/// Log floor matching the likelihood test's zero-rate handling.
const LOG_RATE_FLOOR: f64 = -30.0;

fn unexpected_payload(name: &str, data: &SharedData) -> QuakeError {
    QuakeError::Share(
        ErrorInfo::new(
            "quake_eval.share_payload_mismatch",
            "shared payload does not match the accumulator's declared shape",
        )
        .with_context("dest", name.to_string())
        .with_context("payload", data.tag().to_string()),
    )
}

fn check_grid_shape(
    name: &str,
    grid: &RateGridAccumulation,
    region: &GriddedRegion,
) -> Result<(), QuakeError> {
    if grid.grid_size != region.grid_size() {
        return Err(QuakeError::Share(
            ErrorInfo::new(
                "quake_eval.share_grid_shape",
                "shared rate grid was accumulated over a different region",
            )
            .with_context("dest", name.to_string())
            .with_context("payload_cells", grid.grid_size.to_string())
            .with_context("region_cells", region.grid_size().to_string()),
        ));
    }
    Ok(())
}

/// Cumulative event counts over the forecast window, as an ensemble quantile
/// band compared with the observed trajectory.
#[derive(Debug, Clone)]
pub struct CumulativeEventPlot {
    origin_epoch_ms: i64,
    end_epoch_ms: i64,
    bins: usize,
    per_catalog: Vec<Vec<u32>>,
}

impl CumulativeEventPlot {
    /// Canonical product name.
    pub const NAME: &'static str = "cum-plot";

    const DEFAULT_BINS: usize = 64;

    /// Creates the plot accumulator for the forecast window.
    pub fn new(origin_epoch_ms: i64, end_epoch_ms: i64) -> Self {
        Self {
            origin_epoch_ms,
            end_epoch_ms,
            bins: Self::DEFAULT_BINS,
            per_catalog: Vec::new(),
        }
    }

    fn cumulative_counts(&self, catalog: &Catalog) -> Vec<u32> {
        let span = (self.end_epoch_ms - self.origin_epoch_ms).max(1) as f64;
        let mut counts = vec![0u32; self.bins];
        for event in catalog.events() {
            let fraction = (event.time_ms - self.origin_epoch_ms) as f64 / span;
            if !(0.0..=1.0).contains(&fraction) {
                continue;
            }
            let idx = ((fraction * self.bins as f64) as usize).min(self.bins - 1);
            counts[idx] += 1;
        }
        let mut running = 0u32;
        for count in counts.iter_mut() {
            running += *count;
            *count = running;
        }
        counts
    }
}

impl CatalogAccumulator for CumulativeEventPlot {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        let counts = self.cumulative_counts(catalog);
        self.per_catalog.push(counts);
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        if self.per_catalog.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no catalogs processed",
            ));
        }
        let span_days = (self.end_epoch_ms - self.origin_epoch_ms) as f64 / 86_400_000.0;
        let xs: Vec<f64> = (1..=self.bins)
            .map(|idx| span_days * idx as f64 / self.bins as f64)
            .collect();
        let mut bands = BandSeries {
            q05: Vec::with_capacity(self.bins),
            q25: Vec::with_capacity(self.bins),
            q50: Vec::with_capacity(self.bins),
            q75: Vec::with_capacity(self.bins),
            q95: Vec::with_capacity(self.bins),
        };
        for bin in 0..self.bins {
            let column = sorted(
                self.per_catalog
                    .iter()
                    .map(|counts| counts[bin] as f64)
                    .collect(),
            );
            bands.q05.push(percentile(&column, 0.05));
            bands.q25.push(percentile(&column, 0.25));
            bands.q50.push(percentile(&column, 0.50));
            bands.q75.push(percentile(&column, 0.75));
            bands.q95.push(percentile(&column, 0.95));
        }
        let observed_curve: Vec<f64> = self
            .cumulative_counts(observed)
            .into_iter()
            .map(|count| count as f64)
            .collect();
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = observed_curve.last().copied();
        result.figures = vec![NamedFigure {
            name: "cum_plot".into(),
            data: FigureData::QuantileBand {
                xs,
                bands,
                observed: observed_curve,
            },
        }];
        Ok(result)
    }
}

/// Magnitude histogram: mean per-catalog magnitude counts next to the
/// observed counts.
#[derive(Debug, Clone)]
pub struct MagnitudeHistogram {
    accumulation: Option<MagnitudeAccumulation>,
}

impl MagnitudeHistogram {
    /// Canonical product name.
    pub const NAME: &'static str = "mag-hist";

    /// Creates the histogram product.
    ///
    /// With `calc = false` streaming is a pass-through and the accumulation
    /// must arrive through shared-state wiring from the m-test.
    pub fn new(calc: bool, min_magnitude: f64) -> Self {
        Self {
            accumulation: calc.then(|| MagnitudeAccumulation::new(min_magnitude)),
        }
    }
}

impl CatalogAccumulator for MagnitudeHistogram {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        if let Some(accumulation) = self.accumulation.as_mut() {
            accumulation.record_catalog(catalog);
        }
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        let Some(accumulation) = self.accumulation.as_ref().filter(|acc| acc.catalogs() > 0)
        else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no magnitude accumulation available (missing m-test wiring?)",
            ));
        };
        let catalogs = accumulation.catalogs() as f64;
        let expected: Vec<f64> = accumulation
            .union
            .iter()
            .map(|&count| count as f64 / catalogs)
            .collect();
        let observed_counts: Vec<f64> = accumulation
            .bin_magnitudes(observed)
            .into_iter()
            .map(|count| count as f64)
            .collect();
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(observed_counts.iter().sum());
        result.figures = vec![NamedFigure {
            name: "mag_hist".into(),
            data: FigureData::PairedBars {
                edges: accumulation.edges.clone(),
                expected,
                observed: observed_counts,
            },
        }];
        Ok(result)
    }

    fn accepts(&self) -> Option<ShareTag> {
        Some(ShareTag::MagnitudeDistribution)
    }

    fn accept_shared(&mut self, data: SharedData) -> Result<(), QuakeError> {
        match data {
            SharedData::MagnitudeDistribution(accumulation) => {
                self.accumulation = Some(accumulation);
                Ok(())
            }
            other => Err(unexpected_payload(Self::NAME, &other)),
        }
    }
}

/// Conditional rate density over the evaluation region with observed events
/// overlaid.
#[derive(Debug, Clone)]
pub struct ConditionalRatePlot {
    region: GriddedRegion,
    grid: Option<RateGridAccumulation>,
}

impl ConditionalRatePlot {
    /// Canonical product name.
    pub const NAME: &'static str = "crd-plot";

    /// Creates the rate-density product over the evaluation region.
    ///
    /// With `calc = false` the grid must arrive from the l-test wiring.
    pub fn new(calc: bool, region: GriddedRegion) -> Self {
        let grid = calc.then(|| RateGridAccumulation::new(&region));
        Self { region, grid }
    }
}

impl CatalogAccumulator for ConditionalRatePlot {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        if let Some(grid) = self.grid.as_mut() {
            grid.record_catalog(catalog, &self.region);
        }
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        let Some(grid) = self.grid.as_ref().filter(|grid| grid.catalogs() > 0) else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no rate accumulation available (missing l-test wiring?)",
            ));
        };
        let catalogs = grid.catalogs() as f64;
        let cells: Vec<(f64, f64, f64)> = self
            .region
            .active_cells()
            .map(|(index, lon, lat)| (lon, lat, grid.total[index] / catalogs))
            .collect();
        let events: Vec<(f64, f64)> = observed
            .events()
            .iter()
            .map(|event| (event.longitude, event.latitude))
            .collect();
        let mut result = EvaluationResult::new(Self::NAME);
        result.figures = vec![NamedFigure {
            name: "crd_plot".into(),
            data: FigureData::RateGrid {
                cells,
                events,
                cell_size_deg: self.region.cell_size_deg(),
            },
        }];
        Ok(result)
    }

    fn accepts(&self) -> Option<ShareTag> {
        Some(ShareTag::RateGrid)
    }

    fn accept_shared(&mut self, data: SharedData) -> Result<(), QuakeError> {
        match data {
            SharedData::RateGrid(grid) => {
                check_grid_shape(Self::NAME, &grid, &self.region)?;
                self.grid = Some(grid);
                Ok(())
            }
            other => Err(unexpected_payload(Self::NAME, &other)),
        }
    }
}

/// Normalized log-likelihood of each observed event under the ensemble's
/// spatial rates.
#[derive(Debug, Clone)]
pub struct SpatialLikelihoodPlot {
    region: GriddedRegion,
    grid: Option<RateGridAccumulation>,
}

impl SpatialLikelihoodPlot {
    /// Canonical product name.
    pub const NAME: &'static str = "like-plot";

    /// Creates the per-event likelihood product.
    ///
    /// With `calc = false` the grid must arrive from the l-test wiring.
    pub fn new(calc: bool, region: GriddedRegion) -> Self {
        let grid = calc.then(|| RateGridAccumulation::new(&region));
        Self { region, grid }
    }
}

impl CatalogAccumulator for SpatialLikelihoodPlot {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        if let Some(grid) = self.grid.as_mut() {
            grid.record_catalog(catalog, &self.region);
        }
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        let Some(grid) = self.grid.as_ref().filter(|grid| grid.catalogs() > 0) else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no rate accumulation available (missing l-test wiring?)",
            ));
        };
        let Some(rates) = grid.normalized_rates() else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "ensemble accumulated no events inside the region",
            ));
        };
        let values: Vec<f64> = observed
            .events()
            .iter()
            .filter_map(|event| self.region.cell_index(event.longitude, event.latitude))
            .map(|cell| {
                let rate = rates[cell];
                if rate > 0.0 {
                    rate.ln()
                } else {
                    LOG_RATE_FLOOR
                }
            })
            .collect();
        if values.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "observed catalog has no events inside the region",
            ));
        }
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(values.iter().sum::<f64>() / values.len() as f64);
        result.figures = vec![NamedFigure {
            name: "like_plot".into(),
            data: FigureData::Histogram {
                values,
                observed: None,
            },
        }];
        Ok(result)
    }

    fn accepts(&self) -> Option<ShareTag> {
        Some(ShareTag::RateGrid)
    }

    fn accept_shared(&mut self, data: SharedData) -> Result<(), QuakeError> {
        match data {
            SharedData::RateGrid(grid) => {
                check_grid_shape(Self::NAME, &grid, &self.region)?;
                self.grid = Some(grid);
                Ok(())
            }
            other => Err(unexpected_payload(Self::NAME, &other)),
        }
    }
}
