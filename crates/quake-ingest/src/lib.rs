#![deny(missing_docs)]
#![doc = "Catalog stream sources, observed-catalog loading, and synthetic ensembles."]

/// Observed-catalog source.
pub mod observed;
/// Lazy catalog streams over event-set files.
pub mod stream;
/// Deterministic synthetic ensemble generation.
pub mod synth;

pub use observed::{load_observed_catalog, ObservedQuery};
pub use stream::{load_stochastic_event_sets, write_event_sets, CatalogSetFormat, CatalogStream};
pub use synth::{synthesize_ensemble, synthesize_observed, write_ensemble, SynthesisSpec};
