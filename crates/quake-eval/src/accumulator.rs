//! The two-phase accumulator contract every consistency test satisfies.

use std::path::{Path, PathBuf};

use quake_core::catalog::Catalog;
use quake_core::errors::{ErrorInfo, QuakeError};
use quake_core::time::epoch_span_years;
use serde::{Deserialize, Serialize};

use crate::result::EvaluationResult;
use crate::share::{ShareTag, SharedData};

/// Read-only run metadata handed to every accumulator at finalize time.
///
/// Computed once at the start of a run; streaming never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Mainshock origin time, epoch milliseconds.
    pub origin_epoch_ms: i64,
    /// Evaluation (end) time, epoch milliseconds.
    pub end_epoch_ms: i64,
    /// Requested ensemble size.
    pub n_cat: usize,
    /// Forecast horizon between origin and evaluation time, in years.
    pub time_horizon_years: f64,
}

impl RunMetadata {
    /// Builds run metadata, deriving the time horizon from the epochs.
    pub fn new(origin_epoch_ms: i64, end_epoch_ms: i64, n_cat: usize) -> Self {
        Self {
            origin_epoch_ms,
            end_epoch_ms,
            n_cat,
            time_horizon_years: epoch_span_years(origin_epoch_ms, end_epoch_ms),
        }
    }
}

/// One statistical consistency test as a two-phase streaming object.
///
/// Phase one streams filtered catalogs through `process_catalog`, building
/// private state bounded by the accumulated summary size — never by
/// `ensemble size x catalog size`. Phase two converts that state plus the
/// observed catalog into an [`EvaluationResult`] exactly once per run.
///
/// Contract:
/// - `process_catalog` receives catalogs that already passed temporal and
///   spatial filtering; implementations never filter internally and never
///   mutate the borrowed catalog (the shared reference enforces what the
///   source workflow approximated with per-accumulator defensive copies).
///   Each call leaves state either fully pre- or fully post-update, so a
///   long run can be interrupted between catalogs without corruption.
/// - `evaluate` is deterministic re-finalization: it reads accumulated state
///   without consuming it, so calling it twice returns identical results.
///   With zero processed catalogs it returns a clearly flagged undefined
///   result rather than fabricating a statistic. `Err` is reserved for
///   contract violations; statistical degeneracies are undefined results.
/// - `plot` renders purely from a finalized result (results embed their
///   figure payloads), skips undefined results, and never mutates its input.
pub trait CatalogAccumulator {
    /// Consumes one filtered catalog and updates internal state.
    fn process_catalog(&mut self, catalog: &Catalog) -> Result<(), QuakeError>;

    /// Finalizes accumulated state against the observed catalog.
    fn evaluate(
        &self,
        observed: &Catalog,
        metadata: &RunMetadata,
    ) -> Result<EvaluationResult, QuakeError>;

    /// Renders the result's figures under `out_dir`, returning artifact
    /// paths. `show` is reserved for interactive display and does not affect
    /// the written artifacts. Undefined results render nothing.
    fn plot(
        &self,
        result: &EvaluationResult,
        out_dir: &Path,
        show: bool,
    ) -> Result<Vec<PathBuf>, QuakeError> {
        crate::plotting::render_result(result, out_dir, show)
    }

    /// Tag of the payload this accumulator can export for aliasing.
    fn exports(&self) -> Option<ShareTag> {
        None
    }

    /// Tag of the payload this accumulator accepts through aliasing.
    fn accepts(&self) -> Option<ShareTag> {
        None
    }

    /// Exports the accumulated payload for a declared-compatible peer.
    fn export_shared(&self) -> Option<SharedData> {
        None
    }

    /// Adopts a payload exported by a declared-compatible peer.
    ///
    /// Only valid between streaming completion and finalize. The default
    /// rejects all payloads; sharing accumulators override it.
    fn accept_shared(&mut self, data: SharedData) -> Result<(), QuakeError> {
        Err(QuakeError::Share(
            ErrorInfo::new(
                "quake_eval.share_unsupported",
                "accumulator does not accept shared state",
            )
            .with_context("payload", data.tag().to_string()),
        ))
    }
}
