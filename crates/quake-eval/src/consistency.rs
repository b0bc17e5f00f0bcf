//! Quantile-producing consistency tests.

use quake_core::catalog::Catalog;
use quake_core::errors::QuakeError;
use quake_core::region::GriddedRegion;

use crate::accumulator::{CatalogAccumulator, RunMetadata};
use crate::result::{EvaluationResult, FigureData, NamedFigure};
use crate::share::{MagnitudeAccumulation, RateGridAccumulation, ShareTag, SharedData};
use crate::stat::{aki_b_value, empirical_quantile, sorted};

/// Log-probability floor applied where the ensemble assigns zero rate.
const LOG_RATE_FLOOR: f64 = -30.0;

/// Magnitude bin width shared by the magnitude-based tests.
const MAGNITUDE_BIN_WIDTH: f64 = 0.1;

/// Number test: compares the observed event count against the ensemble's
/// count distribution.
#[derive(Debug, Clone, Default)]
pub struct NumberTest {
    counts: Vec<u64>,
}

impl NumberTest {
    /// Canonical test name.
    pub const NAME: &'static str = "n-test";

    /// Creates an empty number test.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogAccumulator for NumberTest {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        self.counts.push(catalog.event_count() as u64);
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        if self.counts.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no catalogs processed",
            ));
        }
        let distribution = sorted(self.counts.iter().map(|&count| count as f64).collect());
        let observed_count = observed.event_count() as f64;
        let quantile = empirical_quantile(&distribution, observed_count);
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(observed_count);
        result.quantile = Some(quantile);
        result.figures = vec![NamedFigure {
            name: "n_test".into(),
            data: FigureData::Histogram {
                values: distribution.clone(),
                observed: Some(observed_count),
            },
        }];
        result.distribution = distribution;
        Ok(result)
    }
}

/// Magnitude test: compares each catalog's binned magnitude distribution
/// against the ensemble union, then places the observation on the resulting
/// discrepancy distribution.
#[derive(Debug, Clone)]
pub struct MagnitudeTest {
    accumulation: MagnitudeAccumulation,
}

impl MagnitudeTest {
    /// Canonical test name.
    pub const NAME: &'static str = "m-test";

    /// Creates a magnitude test binning from the completeness magnitude.
    pub fn new(min_magnitude: f64) -> Self {
        Self {
            accumulation: MagnitudeAccumulation::new(min_magnitude),
        }
    }

    fn discrepancy(counts: &[u64], union_pmf: &[f64]) -> Option<f64> {
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return None;
        }
        let mut statistic = 0.0;
        for (count, union) in counts.iter().zip(union_pmf.iter()) {
            let p = *count as f64 / total as f64;
            let delta = p - union;
            statistic += delta * delta;
        }
        Some(statistic)
    }
}

impl CatalogAccumulator for MagnitudeTest {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        self.accumulation.record_catalog(catalog);
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        if self.accumulation.catalogs() == 0 {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no catalogs processed",
            ));
        }
        let union_total: u64 = self.accumulation.union.iter().sum();
        if union_total == 0 {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "ensemble accumulated no events above the completeness magnitude",
            ));
        }
        let union_pmf: Vec<f64> = self
            .accumulation
            .union
            .iter()
            .map(|&count| count as f64 / union_total as f64)
            .collect();
        let values: Vec<f64> = self
            .accumulation
            .per_catalog
            .iter()
            .filter_map(|counts| Self::discrepancy(counts, &union_pmf))
            .collect();
        if values.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "every catalog was empty after filtering",
            ));
        }
        let observed_counts = self.accumulation.bin_magnitudes(observed);
        let Some(observed_statistic) = Self::discrepancy(&observed_counts, &union_pmf) else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "observed catalog has no events above the completeness magnitude",
            ));
        };
        let distribution = sorted(values);
        let quantile = empirical_quantile(&distribution, observed_statistic);
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(observed_statistic);
        result.quantile = Some(quantile);
        result.figures = vec![NamedFigure {
            name: "m_test".into(),
            data: FigureData::Histogram {
                values: distribution.clone(),
                observed: Some(observed_statistic),
            },
        }];
        result.distribution = distribution;
        Ok(result)
    }

    fn exports(&self) -> Option<ShareTag> {
        Some(ShareTag::MagnitudeDistribution)
    }

    fn export_shared(&self) -> Option<SharedData> {
        Some(SharedData::MagnitudeDistribution(self.accumulation.clone()))
    }
}

/// B-value test: places the observed Aki maximum-likelihood b-value on the
/// ensemble's b-value distribution.
#[derive(Debug, Clone)]
pub struct BValueTest {
    min_magnitude: f64,
    b_values: Vec<f64>,
}

impl BValueTest {
    /// Canonical test name.
    pub const NAME: &'static str = "bv-test";

    /// Creates a b-value test with the given completeness magnitude.
    pub fn new(min_magnitude: f64) -> Self {
        Self {
            min_magnitude,
            b_values: Vec::new(),
        }
    }

    fn estimate(&self, catalog: &Catalog) -> Option<f64> {
        let magnitudes: Vec<f64> = catalog.magnitudes().collect();
        aki_b_value(&magnitudes, self.min_magnitude, MAGNITUDE_BIN_WIDTH)
    }
}

impl CatalogAccumulator for BValueTest {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        // catalogs where the estimator degenerates (empty, or mean at the
        // completeness floor) contribute nothing to the distribution
        if let Some(b) = self.estimate(catalog) {
            self.b_values.push(b);
        }
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        if self.b_values.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no catalog yielded a defined b-value",
            ));
        }
        let Some(observed_statistic) = self.estimate(observed) else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "observed catalog yields no defined b-value",
            ));
        };
        let distribution = sorted(self.b_values.clone());
        let quantile = empirical_quantile(&distribution, observed_statistic);
        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(observed_statistic);
        result.quantile = Some(quantile);
        result.figures = vec![NamedFigure {
            name: "bv_test".into(),
            data: FigureData::Histogram {
                values: distribution.clone(),
                observed: Some(observed_statistic),
            },
        }];
        result.distribution = distribution;
        Ok(result)
    }
}

/// Joint likelihood and spatial test over the gridded rate field.
///
/// Accumulates one dense total grid plus sparse per-catalog cell counts,
/// then scores each catalog (and the observation) against the ensemble's
/// normalized spatial rates. Reports the likelihood quantile as the primary
/// statistic and both branches under `named_quantiles`.
#[derive(Debug, Clone)]
pub struct LikelihoodSpatialTest {
    region: GriddedRegion,
    grid: RateGridAccumulation,
}

impl LikelihoodSpatialTest {
    /// Canonical test name.
    pub const NAME: &'static str = "l-test";

    /// Creates a likelihood test over the evaluation region.
    pub fn new(region: GriddedRegion) -> Self {
        let grid = RateGridAccumulation::new(&region);
        Self { region, grid }
    }

    fn score(sparse: &[(u32, u32)], log_rates: &[f64]) -> Option<(f64, f64)> {
        let mut joint = 0.0;
        let mut events = 0u32;
        for &(cell, count) in sparse {
            joint += count as f64 * log_rates[cell as usize];
            events += count;
        }
        if events == 0 {
            return None;
        }
        Some((joint, joint / events as f64))
    }
}

impl CatalogAccumulator for LikelihoodSpatialTest {
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError> {
        self.grid.record_catalog(catalog, &self.region);
        Ok(())
    }

    fn evaluate(
        &self,
        observed: &Catalog,
        _metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError> {
        if self.grid.catalogs() == 0 {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "no catalogs processed",
            ));
        }
        let Some(rates) = self.grid.normalized_rates() else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "ensemble accumulated no events inside the region",
            ));
        };
        let log_rates: Vec<f64> = rates
            .iter()
            .map(|&rate| if rate > 0.0 { rate.ln() } else { LOG_RATE_FLOOR })
            .collect();
        let mut joint_values = Vec::new();
        let mut spatial_values = Vec::new();
        for sparse in &self.grid.per_catalog {
            if let Some((joint, spatial)) = Self::score(sparse, &log_rates) {
                joint_values.push(joint);
                spatial_values.push(spatial);
            }
        }
        if joint_values.is_empty() {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "every catalog was empty after filtering",
            ));
        }
        let observed_sparse = self.grid.grid_catalog(observed, &self.region);
        let Some((observed_joint, observed_spatial)) = Self::score(&observed_sparse, &log_rates)
        else {
            return Ok(EvaluationResult::undefined(
                Self::NAME,
                "observed catalog has no events inside the region",
            ));
        };
        let joint_distribution = sorted(joint_values);
        let spatial_distribution = sorted(spatial_values);
        let joint_quantile = empirical_quantile(&joint_distribution, observed_joint);
        let spatial_quantile = empirical_quantile(&spatial_distribution, observed_spatial);

        let mut result = EvaluationResult::new(Self::NAME);
        result.observed_statistic = Some(observed_joint);
        result.quantile = Some(joint_quantile);
        result
            .named_quantiles
            .insert("l-test".into(), joint_quantile);
        result
            .named_quantiles
            .insert("s-test".into(), spatial_quantile);
        result.figures = vec![
            NamedFigure {
                name: "l_test".into(),
                data: FigureData::Histogram {
                    values: joint_distribution.clone(),
                    observed: Some(observed_joint),
                },
            },
            NamedFigure {
                name: "s_test".into(),
                data: FigureData::Histogram {
                    values: spatial_distribution,
                    observed: Some(observed_spatial),
                },
            },
        ];
        result.distribution = joint_distribution;
        Ok(result)
    }

    fn exports(&self) -> Option<ShareTag> {
        Some(ShareTag::RateGrid)
    }

    fn export_shared(&self) -> Option<SharedData> {
        Some(SharedData::RateGrid(self.grid.clone()))
    }
}
