//! Single-pass orchestration of the catalog stream over all accumulators.

use std::path::Path;
use std::time::Instant;

use indexmap::IndexMap;
use quake_core::catalog::Catalog;
use quake_core::errors::{ErrorInfo, QuakeError};
use quake_core::filter::CatalogFilter;
use serde::{Deserialize, Serialize};

use crate::accumulator::RunMetadata;
use crate::registry::AccumulatorRegistry;
use crate::result::EvaluationResult;

/// Phase of an orchestrated run.
///
/// Transitions move strictly forward: `Created -> Streaming -> Finalizing ->
/// Done`. `Done` is terminal; re-entering an earlier phase is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// Registry wired, no catalog consumed yet.
    Created,
    /// The single pass over the catalog stream.
    Streaming,
    /// Accumulators are being evaluated against the observation.
    Finalizing,
    /// All results collected.
    Done,
}

/// How the streaming phase ended.
///
/// Stopping at the cap is the expected clean stop. Exhaustion means the
/// ensemble held fewer catalogs than requested: the partial ensemble still
/// yields valid (if noisier) statistics, so it is reported, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamOutcome {
    /// Configured catalog cap.
    pub requested: usize,
    /// Catalogs actually consumed.
    pub consumed: usize,
    /// True when the stream ran dry before the cap.
    pub exhausted: bool,
    /// Wall time spent streaming, in seconds. Observability only; results
    /// never depend on it.
    pub elapsed_secs: f64,
}

impl StreamOutcome {
    /// Catalogs missing relative to the requested cap.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.consumed)
    }
}

/// Observer for per-catalog progress and phase milestones.
///
/// Purely observational: implementations must not influence results.
pub trait Progress {
    /// Called after each catalog is fanned out to every accumulator.
    fn on_catalog(&mut self, _consumed: usize, _event_count: usize) {}
    /// Called once when the streaming phase ends.
    fn on_stream_complete(&mut self, _outcome: &StreamOutcome) {}
    /// Called after each accumulator finalizes.
    fn on_finalized(&mut self, _name: &str) {}
}

/// Progress sink that discards all notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl Progress for NullProgress {}

/// Finalized results of an orchestrated run, keyed by test name in
/// registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutput {
    /// Results per test, preserving registration order.
    pub results: IndexMap<String, EvaluationResult>,
    /// How the streaming phase ended.
    pub stream: StreamOutcome,
    /// Metadata the run was evaluated under.
    pub metadata: RunMetadata,
}

/// Drives exactly one pass over a catalog stream and one finalize pass.
///
/// The orchestrator owns the registry for the duration of the run; each
/// accumulator's private state is only ever touched by one step at a time,
/// so the single-threaded pipeline needs no locking discipline.
#[derive(Debug)]
pub struct EvaluationRun {
    registry: AccumulatorRegistry,
    filter: CatalogFilter,
    metadata: RunMetadata,
    phase: RunPhase,
    outcome: Option<StreamOutcome>,
}

impl EvaluationRun {
    /// Wires a run from its registry, filter, and metadata.
    ///
    /// Share links are validated here: connecting incompatible accumulators
    /// fails at wiring time, before any catalog is consumed.
    pub fn new(
        registry: AccumulatorRegistry,
        filter: CatalogFilter,
        metadata: RunMetadata,
    ) -> Result<Self, QuakeError> {
        registry.validate_links()?;
        Ok(Self {
            registry,
            filter,
            metadata,
            phase: RunPhase::Created,
            outcome: None,
        })
    }

    /// Current phase of the run.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Metadata the run was configured with.
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Streams catalogs through every registered accumulator.
    ///
    /// Consumes exactly `min(n_cat, available)` catalogs. Each catalog is
    /// validated (malformed catalogs abort the whole run), filtered once,
    /// and fanned out to every accumulator through a shared immutable
    /// reference before the next catalog is pulled.
    pub fn stream<S>(
        &mut self,
        catalogs: S,
        progress: &mut dyn Progress,
    ) -> Result<StreamOutcome, QuakeError>
    where
        S: IntoIterator<Item = Result<Catalog, QuakeError>>,
    {
        if self.phase != RunPhase::Created {
            return Err(phase_error("stream", self.phase));
        }
        self.phase = RunPhase::Streaming;

        let started = Instant::now();
        let mut source = catalogs.into_iter();
        let mut consumed = 0usize;
        let mut exhausted = false;
        while consumed < self.metadata.n_cat {
            match source.next() {
                Some(Ok(catalog)) => {
                    catalog.validate()?;
                    let filtered = self.filter.apply(&catalog);
                    for (_, accumulator) in self.registry.iter_mut() {
                        accumulator.process_catalog(&filtered)?;
                    }
                    consumed += 1;
                    progress.on_catalog(consumed, filtered.event_count());
                }
                Some(Err(err)) => return Err(err),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        let outcome = StreamOutcome {
            requested: self.metadata.n_cat,
            consumed,
            exhausted,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        progress.on_stream_complete(&outcome);
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Applies declared share links, then evaluates every accumulator
    /// against the observed catalog in registration order.
    pub fn finalize(
        &mut self,
        observed: &Catalog,
        progress: &mut dyn Progress,
    ) -> Result<EvaluationOutput, QuakeError> {
        if self.phase != RunPhase::Streaming {
            return Err(phase_error("finalize", self.phase));
        }
        // a stream pass that aborted leaves no outcome; its partially
        // accumulated state must be discarded, never finalized
        let stream = self.outcome.clone().ok_or_else(|| {
            QuakeError::Eval(ErrorInfo::new(
                "quake_eval.aborted_stream",
                "the streaming pass did not complete; accumulated state is untrusted",
            ))
        })?;
        observed.validate()?;
        self.registry.apply_links()?;
        self.phase = RunPhase::Finalizing;

        let mut results = IndexMap::new();
        for (name, accumulator) in self.registry.iter() {
            let result = accumulator.evaluate(observed, &self.metadata)?;
            progress.on_finalized(name);
            results.insert(name.clone(), result);
        }
        self.phase = RunPhase::Done;

        Ok(EvaluationOutput {
            results,
            stream,
            metadata: self.metadata,
        })
    }

    /// Renders every defined result's figures and attaches artifact paths.
    ///
    /// Undefined results are skipped rather than rendered.
    pub fn render_artifacts(
        &self,
        output: &mut EvaluationOutput,
        out_dir: &Path,
        show: bool,
    ) -> Result<(), QuakeError> {
        if self.phase != RunPhase::Done {
            return Err(phase_error("render_artifacts", self.phase));
        }
        for (name, accumulator) in self.registry.iter() {
            if let Some(result) = output.results.get_mut(name) {
                let artifacts = accumulator.plot(result, out_dir, show)?;
                *result = result.clone().with_artifacts(artifacts);
            }
        }
        Ok(())
    }

    /// Convenience wrapper driving stream and finalize in one call.
    pub fn run<S>(
        &mut self,
        catalogs: S,
        observed: &Catalog,
        progress: &mut dyn Progress,
    ) -> Result<EvaluationOutput, QuakeError>
    where
        S: IntoIterator<Item = Result<Catalog, QuakeError>>,
    {
        self.stream(catalogs, progress)?;
        self.finalize(observed, progress)
    }
}

fn phase_error(operation: &str, phase: RunPhase) -> QuakeError {
    let phase_name = match phase {
        RunPhase::Created => "created",
        RunPhase::Streaming => "streaming",
        RunPhase::Finalizing => "finalizing",
        RunPhase::Done => "done",
    };
    QuakeError::Eval(
        ErrorInfo::new(
            "quake_eval.invalid_phase",
            "operation is not valid in the run's current phase",
        )
        .with_context("operation", operation.to_string())
        .with_context("phase", phase_name.to_string()),
    )
}
