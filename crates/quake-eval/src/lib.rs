#![deny(missing_docs)]
#![doc = "Streaming multi-test evaluation protocol for catalog forecasts."]

//! An unbounded ensemble of simulated catalogs is processed one at a time,
//! in constant memory per test, against several statistical accumulators
//! simultaneously; a finalize pass then converts accumulated state plus one
//! observed catalog into quantile results and diagnostic figures.

/// The two-phase accumulator contract and run metadata.
pub mod accumulator;
/// Quantile-producing consistency tests.
pub mod consistency;
/// Plot-producing diagnostic accumulators.
pub mod diagnostics;
/// Results-export hook (canonical JSON + CSV table).
pub mod export;
/// Canonical hashing for finalized results.
pub mod hash;
/// Single-pass orchestration over the catalog stream.
pub mod orchestrator;
mod plotting;
/// Insertion-ordered registry and shared-state wiring.
pub mod registry;
/// Immutable evaluation results.
pub mod result;
/// Canonical JSON serde helpers.
pub mod serde;
/// Typed shared-state payloads.
pub mod share;
/// Empirical distribution helpers.
pub mod stat;

pub use accumulator::{CatalogAccumulator, RunMetadata};
pub use consistency::{BValueTest, LikelihoodSpatialTest, MagnitudeTest, NumberTest};
pub use diagnostics::{
    ConditionalRatePlot, CumulativeEventPlot, MagnitudeHistogram, SpatialLikelihoodPlot,
};
pub use orchestrator::{
    EvaluationOutput, EvaluationRun, NullProgress, Progress, RunPhase, StreamOutcome,
};
pub use registry::{AccumulatorRegistry, ShareLink};
pub use result::{EvaluationResult, FigureData, NamedFigure, ResultStatus};
pub use share::{MagnitudeAccumulation, RateGridAccumulation, ShareTag, SharedData};
