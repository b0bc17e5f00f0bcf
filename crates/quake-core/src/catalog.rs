//! Seismic event catalogs: one simulated realization or the observed record.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, QuakeError};
use crate::region::GriddedRegion;

/// A single seismic event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Origin time as milliseconds since the UTC epoch.
    pub time_ms: i64,
    /// Epicentral longitude in decimal degrees.
    pub longitude: f64,
    /// Epicentral latitude in decimal degrees.
    pub latitude: f64,
    /// Hypocentral depth in kilometres.
    pub depth_km: f64,
    /// Moment magnitude.
    pub magnitude: f64,
}

impl Event {
    /// Returns true when every numeric field is finite.
    pub fn is_well_formed(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.depth_km.is_finite()
            && self.magnitude.is_finite()
    }
}

/// An ordered, immutable collection of seismic events.
///
/// Filtering never mutates in place: each filter produces a new derived
/// catalog carrying the same name and ensemble index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Human readable catalog name (forecast name or observed source).
    pub name: String,
    /// Index within the ensemble; `None` for the observed catalog.
    pub index: Option<usize>,
    events: Vec<Event>,
}

impl Catalog {
    /// Creates a catalog from an ordered event sequence.
    pub fn new(name: impl Into<String>, index: Option<usize>, events: Vec<Event>) -> Self {
        Self {
            name: name.into(),
            index,
            events,
        }
    }

    /// Returns the ordered event slice.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the number of events in the catalog.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns an iterator over event magnitudes in catalog order.
    pub fn magnitudes(&self) -> impl Iterator<Item = f64> + '_ {
        self.events.iter().map(|event| event.magnitude)
    }

    /// Verifies that every event carries finite fields.
    ///
    /// A malformed event is fatal for the run that produced it; partially
    /// accumulated state downstream of a malformed catalog cannot be trusted.
    pub fn validate(&self) -> Result<(), QuakeError> {
        for (position, event) in self.events.iter().enumerate() {
            if !event.is_well_formed() {
                let mut info = ErrorInfo::new(
                    "quake_core.malformed_event",
                    "catalog event carries non-finite fields",
                )
                .with_context("event", position.to_string())
                .with_context("catalog", self.name.clone());
                if let Some(index) = self.index {
                    info = info.with_context("ensemble_index", index.to_string());
                }
                return Err(QuakeError::Catalog(info));
            }
        }
        Ok(())
    }

    /// Returns a derived catalog containing events strictly before the cutoff.
    pub fn filter_time_before(&self, cutoff_epoch_ms: i64) -> Catalog {
        let events = self
            .events
            .iter()
            .copied()
            .filter(|event| event.time_ms < cutoff_epoch_ms)
            .collect();
        Catalog {
            name: self.name.clone(),
            index: self.index,
            events,
        }
    }

    /// Returns a derived catalog containing events inside the region.
    pub fn filter_spatial(&self, region: &GriddedRegion) -> Catalog {
        let events = self
            .events
            .iter()
            .copied()
            .filter(|event| region.contains(event.longitude, event.latitude))
            .collect();
        Catalog {
            name: self.name.clone(),
            index: self.index,
            events,
        }
    }

    /// Returns a derived catalog containing events at or above the threshold.
    pub fn filter_min_magnitude(&self, min_magnitude: f64) -> Catalog {
        let events = self
            .events
            .iter()
            .copied()
            .filter(|event| event.magnitude >= min_magnitude)
            .collect();
        Catalog {
            name: self.name.clone(),
            index: self.index,
            events,
        }
    }

    /// Origin time of the first event, if any.
    pub fn start_time_ms(&self) -> Option<i64> {
        self.events.iter().map(|event| event.time_ms).min()
    }

    /// Origin time of the last event, if any.
    pub fn end_time_ms(&self) -> Option<i64> {
        self.events.iter().map(|event| event.time_ms).max()
    }
}
