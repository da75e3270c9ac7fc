//! Per-instrument storage and per-collector temporal reconciliation.
//!
//! [`AsyncMetricStorage`] is the ingestion entry point: it diffs absolute
//! observations against the last seen value and accumulates unreported
//! deltas. [`TemporalMetricStorage`] fans drained deltas out to every
//! registered collector and reports each collector's share exactly once,
//! in that collector's temporality.

#![warn(missing_docs)]

pub mod async_storage;
pub mod attributes_map;
pub mod collector;
pub mod temporal;

pub use async_storage::AsyncMetricStorage;
pub use attributes_map::AttributesHashMap;
pub use collector::{CollectorHandle, CollectorId, SimpleCollector};
pub use temporal::TemporalMetricStorage;
