//! Observed-catalog source: a pre-fetched events file reduced by a query.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use quake_core::catalog::{Catalog, Event};
use quake_core::errors::{ErrorInfo, QuakeError};
use quake_core::region::BoundingBox;
use serde::{Deserialize, Serialize};

/// Selection applied to the observed record before spatial masking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedQuery {
    /// Earliest event time, epoch milliseconds (inclusive).
    pub start_epoch_ms: i64,
    /// Latest event time, epoch milliseconds (exclusive).
    pub end_epoch_ms: i64,
    /// Geographic bounding box.
    pub bounds: BoundingBox,
    /// Minimum magnitude threshold (inclusive).
    pub min_magnitude: f64,
}

impl ObservedQuery {
    fn matches(&self, event: &Event) -> bool {
        event.time_ms >= self.start_epoch_ms
            && event.time_ms < self.end_epoch_ms
            && event.magnitude >= self.min_magnitude
            && self.bounds.contains(event.longitude, event.latitude)
    }
}

/// Loads the observed catalog from a JSON events file and reduces it by the
/// query. The caller applies the evaluation-region mask afterwards.
pub fn load_observed_catalog(path: &Path, query: &ObservedQuery) -> Result<Catalog, QuakeError> {
    let file = File::open(path).map_err(|err| {
        QuakeError::Stream(
            ErrorInfo::new("quake_ingest.observed_open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let events: Vec<Event> = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
        QuakeError::Stream(
            ErrorInfo::new("quake_ingest.observed_decode", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let selected = events
        .into_iter()
        .filter(|event| query.matches(event))
        .collect();
    Ok(Catalog::new("observed", None, selected))
}
