//! Temporal and spatial catalog filtering.

use crate::catalog::Catalog;
use crate::region::GriddedRegion;

/// Applies the run's temporal cutoff and spatial mask to one catalog.
///
/// The filter is a pure function over its inputs: it holds no mutable state
/// and always produces a new derived catalog. Every catalog dispatched to an
/// accumulator must have passed through this filter first; accumulators never
/// filter internally.
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    cutoff_epoch_ms: i64,
    region: GriddedRegion,
}

impl CatalogFilter {
    /// Creates a filter for the given evaluation cutoff and region.
    pub fn new(cutoff_epoch_ms: i64, region: GriddedRegion) -> Self {
        Self {
            cutoff_epoch_ms,
            region,
        }
    }

    /// Returns the evaluation region the filter masks against.
    pub fn region(&self) -> &GriddedRegion {
        &self.region
    }

    /// Produces the filtered, derived catalog.
    pub fn apply(&self, catalog: &Catalog) -> Catalog {
        catalog
            .filter_time_before(self.cutoff_epoch_ms)
            .filter_spatial(&self.region)
    }
}
