//! Typed shared-state payloads exchanged between compatible accumulators.
//!
//! Some accumulators summarise the same underlying distribution (the m-test
//! and the magnitude histogram both bin magnitudes; the likelihood test and
//! the rate-density plots both grid event locations). Rather than paying for
//! the accumulation twice, the orchestrator aliases the source accumulator's
//! payload onto the destination after streaming completes and before either
//! party finalizes. The exchange is explicit and tag-checked; wiring
//! incompatible shapes is fatal before the finalize phase begins.

use std::fmt;

use quake_core::catalog::Catalog;
use quake_core::region::GriddedRegion;
use serde::{Deserialize, Serialize};

/// Compatibility tag declared by sharing accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShareTag {
    /// Per-catalog binned magnitude counts plus their union.
    MagnitudeDistribution,
    /// Per-catalog sparse cell counts plus the dense total grid.
    RateGrid,
}

impl fmt::Display for ShareTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareTag::MagnitudeDistribution => write!(f, "magnitude-distribution"),
            ShareTag::RateGrid => write!(f, "rate-grid"),
        }
    }
}

/// Accumulated payload moved between accumulators by the wiring step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SharedData {
    /// Payload exported by a magnitude-binning accumulator.
    MagnitudeDistribution(MagnitudeAccumulation),
    /// Payload exported by a spatial-gridding accumulator.
    RateGrid(RateGridAccumulation),
}

impl SharedData {
    /// Tag identifying the payload shape.
    pub fn tag(&self) -> ShareTag {
        match self {
            SharedData::MagnitudeDistribution(_) => ShareTag::MagnitudeDistribution,
            SharedData::RateGrid(_) => ShareTag::RateGrid,
        }
    }
}

/// Fixed-bin magnitude accumulation across a catalog ensemble.
///
/// Bin edges span the minimum magnitude up to Mw 9 in 0.1 steps; per-catalog
/// counts are one fixed-size vector each, so the state grows with the
/// ensemble only, never with catalog size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeAccumulation {
    /// Bin edges (left inclusive; last bin right inclusive).
    pub edges: Vec<f64>,
    /// Binned counts per processed catalog, in processing order.
    pub per_catalog: Vec<Vec<u64>>,
    /// Element-wise sum of all per-catalog counts.
    pub union: Vec<u64>,
}

impl MagnitudeAccumulation {
    const MAX_MAGNITUDE: f64 = 9.0;
    const BIN_WIDTH: f64 = 0.1;

    /// Creates an empty accumulation with edges from the completeness
    /// magnitude up to Mw 9.
    pub fn new(min_magnitude: f64) -> Self {
        let bins = ((Self::MAX_MAGNITUDE - min_magnitude) / Self::BIN_WIDTH).ceil().max(1.0) as usize;
        let edges = (0..=bins)
            .map(|idx| min_magnitude + idx as f64 * Self::BIN_WIDTH)
            .collect();
        Self {
            edges,
            per_catalog: Vec::new(),
            union: vec![0; bins],
        }
    }

    /// Number of catalogs recorded so far.
    pub fn catalogs(&self) -> usize {
        self.per_catalog.len()
    }

    /// Bins one catalog's magnitudes and folds them into the union.
    pub fn record_catalog(&mut self, catalog: &Catalog) {
        let counts = self.bin_magnitudes(catalog);
        for (total, count) in self.union.iter_mut().zip(counts.iter()) {
            *total += count;
        }
        self.per_catalog.push(counts);
    }

    /// Bins a catalog's magnitudes without recording them.
    pub fn bin_magnitudes(&self, catalog: &Catalog) -> Vec<u64> {
        let bins = self.union.len();
        let start = self.edges[0];
        let mut counts = vec![0u64; bins];
        for magnitude in catalog.magnitudes() {
            if magnitude < start {
                continue;
            }
            let mut idx = ((magnitude - start) / Self::BIN_WIDTH).floor() as usize;
            if idx >= bins {
                idx = bins - 1;
            }
            counts[idx] += 1;
        }
        counts
    }
}

/// Spatial rate accumulation over a gridded region.
///
/// The dense `total` grid is single (O(cells)); per-catalog counts are kept
/// sparse, bounded by the catalog's filtered event count. This is the
/// accumulated summary for likelihood-style tests: full catalogs are never
/// retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateGridAccumulation {
    /// Total grid size the counts index into.
    pub grid_size: usize,
    /// Summed event counts per cell across all recorded catalogs.
    pub total: Vec<f64>,
    /// Sparse `(cell, count)` pairs per catalog, sorted by cell.
    pub per_catalog: Vec<Vec<(u32, u32)>>,
}

impl RateGridAccumulation {
    /// Creates an empty accumulation for the given region.
    pub fn new(region: &GriddedRegion) -> Self {
        Self {
            grid_size: region.grid_size(),
            total: vec![0.0; region.grid_size()],
            per_catalog: Vec::new(),
        }
    }

    /// Number of catalogs recorded so far.
    pub fn catalogs(&self) -> usize {
        self.per_catalog.len()
    }

    /// Grids one catalog's epicenters and folds them into the total.
    pub fn record_catalog(&mut self, catalog: &Catalog, region: &GriddedRegion) {
        let sparse = self.grid_catalog(catalog, region);
        for &(cell, count) in &sparse {
            self.total[cell as usize] += count as f64;
        }
        self.per_catalog.push(sparse);
    }

    /// Grids a catalog's epicenters without recording them.
    pub fn grid_catalog(&self, catalog: &Catalog, region: &GriddedRegion) -> Vec<(u32, u32)> {
        let mut counts = std::collections::BTreeMap::new();
        for event in catalog.events() {
            if let Some(cell) = region.cell_index(event.longitude, event.latitude) {
                *counts.entry(cell as u32).or_insert(0u32) += 1;
            }
        }
        counts.into_iter().collect()
    }

    /// Normalized spatial probability mass per cell, if any events exist.
    pub fn normalized_rates(&self) -> Option<Vec<f64>> {
        let total: f64 = self.total.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(self.total.iter().map(|count| count / total).collect())
    }
}
