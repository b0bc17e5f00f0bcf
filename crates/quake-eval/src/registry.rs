//! Insertion-ordered accumulator registry and shared-state wiring.

use indexmap::IndexMap;
use quake_core::errors::{ErrorInfo, QuakeError};
use serde::{Deserialize, Serialize};

use crate::accumulator::CatalogAccumulator;

/// Declared aliasing of one accumulator's payload onto another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    /// Test name exporting its accumulated payload.
    pub source: String,
    /// Test name adopting the payload before finalize.
    pub dest: String,
}

/// Named mapping from test identifier to accumulator instance.
///
/// Insertion order defines the finalize order and therefore the report
/// order. Share links are declared up front and validated before any
/// streaming happens; applying them is the orchestrator's job, strictly
/// between streaming and finalize.
#[derive(Default)]
pub struct AccumulatorRegistry {
    entries: IndexMap<String, Box<dyn CatalogAccumulator>>,
    links: Vec<ShareLink>,
}

impl std::fmt::Debug for AccumulatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumulatorRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("links", &self.links)
            .finish()
    }
}

impl AccumulatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an accumulator under a unique test name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        accumulator: Box<dyn CatalogAccumulator>,
    ) -> Result<(), QuakeError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(QuakeError::Eval(
                ErrorInfo::new(
                    "quake_eval.duplicate_test",
                    "a test with this name is already registered",
                )
                .with_context("name", name),
            ));
        }
        self.entries.insert(name, accumulator);
        Ok(())
    }

    /// Declares that `dest` adopts `source`'s accumulated payload.
    pub fn link_shared(&mut self, source: impl Into<String>, dest: impl Into<String>) {
        self.links.push(ShareLink {
            source: source.into(),
            dest: dest.into(),
        });
    }

    /// Validates every declared link against the registered accumulators.
    ///
    /// Checks are structural only (names exist, tags declared and equal), so
    /// a mismatch is caught at wiring time, long before finalize.
    pub fn validate_links(&self) -> Result<(), QuakeError> {
        for link in &self.links {
            if link.source == link.dest {
                return Err(share_error(
                    "quake_eval.share_self",
                    "an accumulator cannot alias its own state",
                    link,
                ));
            }
            let source = self.entries.get(&link.source).ok_or_else(|| {
                share_error(
                    "quake_eval.share_unknown_source",
                    "share link names an unregistered source",
                    link,
                )
            })?;
            let dest = self.entries.get(&link.dest).ok_or_else(|| {
                share_error(
                    "quake_eval.share_unknown_dest",
                    "share link names an unregistered destination",
                    link,
                )
            })?;
            let export_tag = source.exports().ok_or_else(|| {
                share_error(
                    "quake_eval.share_no_export",
                    "source accumulator exports no payload",
                    link,
                )
            })?;
            let accept_tag = dest.accepts().ok_or_else(|| {
                share_error(
                    "quake_eval.share_no_accept",
                    "destination accumulator accepts no payload",
                    link,
                )
            })?;
            if export_tag != accept_tag {
                return Err(QuakeError::Share(
                    ErrorInfo::new(
                        "quake_eval.share_tag_mismatch",
                        "share link connects incompatible payload shapes",
                    )
                    .with_context("source", link.source.clone())
                    .with_context("dest", link.dest.clone())
                    .with_context("exports", export_tag.to_string())
                    .with_context("accepts", accept_tag.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Moves each linked payload from its source to its destination.
    pub(crate) fn apply_links(&mut self) -> Result<(), QuakeError> {
        let links = self.links.clone();
        for link in &links {
            let payload = self
                .entries
                .get(&link.source)
                .and_then(|source| source.export_shared())
                .ok_or_else(|| {
                    share_error(
                        "quake_eval.share_empty_export",
                        "source accumulator produced no payload to share",
                        link,
                    )
                })?;
            let dest = self.entries.get_mut(&link.dest).ok_or_else(|| {
                share_error(
                    "quake_eval.share_unknown_dest",
                    "share link names an unregistered destination",
                    link,
                )
            })?;
            dest.accept_shared(payload)?;
        }
        Ok(())
    }

    /// Number of registered accumulators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no accumulator is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered test names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &Box<dyn CatalogAccumulator>)> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&String, &mut Box<dyn CatalogAccumulator>)> {
        self.entries.iter_mut()
    }
}

fn share_error(code: &str, message: &str, link: &ShareLink) -> QuakeError {
    QuakeError::Share(
        ErrorInfo::new(code, message)
            .with_context("source", link.source.clone())
            .with_context("dest", link.dest.clone()),
    )
}
