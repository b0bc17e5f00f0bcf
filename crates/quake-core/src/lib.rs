#![deny(missing_docs)]
#![doc = "Core catalog, region, and timing types for catalog-based forecast evaluation."]

/// Seismic event catalogs and derived-catalog filtering.
pub mod catalog;
/// Structured error types shared across the quake crates.
pub mod errors;
/// Temporal and spatial catalog filtering.
pub mod filter;
/// Geographic regions, buffer polygons, and magnitude scaling.
pub mod region;
/// Deterministic RNG wrapper and seed derivation.
pub mod rng;
/// Epoch and calendar conversions.
pub mod time;

pub use catalog::{Catalog, Event};
pub use errors::{ErrorInfo, QuakeError};
pub use filter::CatalogFilter;
pub use region::{
    california_relm_region, masked_region, BoundingBox, GriddedRegion, Polygon,
    WellsAndCoppersmith,
};
pub use rng::{derive_substream_seed, RngHandle};
pub use time::SECONDS_PER_ASTRONOMICAL_YEAR;
