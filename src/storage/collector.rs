//! Collector identities, as seen by this core.
//!
//! Collector registration, scheduling and deregistration live in the
//! surrounding SDK; storages only consume a roster of handles at collect
//! time and key per-collector state by [`CollectorId`].

use crate::core::types::{InstrumentKind, Temporality};
use serde::{Deserialize, Serialize};

/// Opaque identity of one registered collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectorId(u64);

impl CollectorId {
    /// Wraps a raw identity assigned by the registrar.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identity value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One independent consumer of aggregated metric data.
///
/// Implementations declare a temporality preference per instrument kind;
/// the temporal storage keeps unreported state per `id()`.
pub trait CollectorHandle: Send + Sync {
    /// This collector's stable identity.
    fn id(&self) -> CollectorId;

    /// The temporality this collector wants for the given instrument kind.
    fn temporality(&self, kind: InstrumentKind) -> Temporality;
}

/// A plain collector handle with one fixed temporality for every
/// instrument kind. Sufficient for most readers and for tests.
#[derive(Debug, Clone)]
pub struct SimpleCollector {
    id: CollectorId,
    temporality: Temporality,
}

impl SimpleCollector {
    /// Creates a handle reporting `temporality` for all instrument kinds.
    pub fn new(id: CollectorId, temporality: Temporality) -> Self {
        Self { id, temporality }
    }
}

impl CollectorHandle for SimpleCollector {
    fn id(&self) -> CollectorId {
        self.id
    }

    fn temporality(&self, _kind: InstrumentKind) -> Temporality {
        self.temporality
    }
}
