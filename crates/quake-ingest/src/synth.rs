//! Deterministic synthetic ensembles for tests, benches, and dry runs.
//!
//! Each catalog draws from its own SipHash-derived substream of the master
//! seed, so ensembles reproduce bit-identically for a given spec regardless
//! of how many catalogs the consumer pulls.

use std::path::Path;

use quake_core::catalog::{Catalog, Event};
use quake_core::errors::QuakeError;
use quake_core::rng::RngHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stream::{write_event_sets, CatalogSetFormat};

/// Substream offset separating the observed catalog from the ensemble.
const OBSERVED_SUBSTREAM: u64 = u64::MAX;

/// Parameters of a synthetic aftershock-like ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSpec {
    /// Master seed; every catalog derives a substream from it.
    pub seed: u64,
    /// Number of simulated catalogs.
    pub n_catalogs: usize,
    /// Mean event count per catalog (Poisson).
    pub mean_events: f64,
    /// Cluster center longitude.
    pub center_longitude: f64,
    /// Cluster center latitude.
    pub center_latitude: f64,
    /// Gaussian scatter around the center, in degrees.
    pub spread_deg: f64,
    /// Completeness magnitude; magnitudes follow Gutenberg-Richter above it.
    pub min_magnitude: f64,
    /// Gutenberg-Richter b-value of the magnitude distribution.
    pub b_value: f64,
    /// Window start, epoch milliseconds.
    pub start_epoch_ms: i64,
    /// Window end, epoch milliseconds.
    pub end_epoch_ms: i64,
}

impl Default for SynthesisSpec {
    fn default() -> Self {
        Self {
            seed: 0x5E15_011C,
            n_catalogs: 100,
            mean_events: 40.0,
            center_longitude: -117.6,
            center_latitude: 35.77,
            spread_deg: 0.35,
            min_magnitude: 2.5,
            b_value: 1.0,
            start_epoch_ms: 1_562_383_193_000,
            end_epoch_ms: 1_594_005_593_000,
        }
    }
}

impl SynthesisSpec {
    fn events_for_substream(&self, substream: u64) -> Vec<Event> {
        let mut rng = RngHandle::substream(self.seed, substream);
        let count = poisson(&mut rng, self.mean_events);
        let span = (self.end_epoch_ms - self.start_epoch_ms).max(1);
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            let (dx, dy) = gaussian_pair(&mut rng);
            let magnitude = self.min_magnitude
                - (1.0 - rng.gen::<f64>()).log10() / self.b_value.max(1e-6);
            events.push(Event {
                time_ms: self.start_epoch_ms + rng.gen_range(0..span),
                longitude: self.center_longitude + dx * self.spread_deg,
                latitude: self.center_latitude + dy * self.spread_deg,
                depth_km: rng.gen_range(1.0..15.0),
                magnitude,
            });
        }
        events.sort_by_key(|event| event.time_ms);
        events
    }
}

/// Generates the full simulated ensemble for the given parameters.
pub fn synthesize_ensemble(spec: &SynthesisSpec) -> Vec<Catalog> {
    (0..spec.n_catalogs)
        .map(|index| {
            Catalog::new(
                "synthetic-etas",
                Some(index),
                spec.events_for_substream(index as u64),
            )
        })
        .collect()
}

/// Generates one observed-style catalog from a reserved substream.
pub fn synthesize_observed(spec: &SynthesisSpec) -> Catalog {
    Catalog::new(
        "synthetic-observed",
        None,
        spec.events_for_substream(OBSERVED_SUBSTREAM),
    )
}

/// Writes the ensemble to disk in the requested stream format.
///
/// Returns the number of catalogs written.
pub fn write_ensemble(
    path: &Path,
    format: CatalogSetFormat,
    spec: &SynthesisSpec,
) -> Result<usize, QuakeError> {
    let event_sets: Vec<Vec<Event>> = (0..spec.n_catalogs)
        .map(|index| spec.events_for_substream(index as u64))
        .collect();
    write_event_sets(path, format, &event_sets)?;
    Ok(event_sets.len())
}

fn poisson(rng: &mut RngHandle, mean: f64) -> usize {
    // Knuth's multiplication method; fine for the modest means used here
    let threshold = (-mean.max(0.0)).exp();
    let mut count = 0usize;
    let mut product = rng.gen::<f64>();
    while product > threshold {
        count += 1;
        product *= rng.gen::<f64>();
    }
    count
}

fn gaussian_pair(rng: &mut RngHandle) -> (f64, f64) {
    // Box-Muller transform
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen::<f64>();
    let radius = (-2.0 * u1.ln()).sqrt();
    let angle = 2.0 * std::f64::consts::PI * u2;
    (radius * angle.cos(), radius * angle.sin())
}
