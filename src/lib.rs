//! Omet - asynchronous-instrument aggregation and temporal reconciliation.
//!
//! Omet is the storage core of a metrics SDK for *asynchronous*
//! (observable) instruments: measurement sources that are polled
//! periodically and report absolute, monotonically non-decreasing values
//! per attribute set. The hard part is converting those absolute
//! observations into correctly delta- or cumulative-scoped values for an
//! arbitrary number of independently scheduled readers ("collectors"),
//! each with its own temporality preference, without losing, duplicating,
//! or cross-contaminating contributions between them.
//!
//! # Architecture
//!
//! - `core`: instrument descriptors, numeric values, errors
//! - `metrics`: attribute sets, aggregation policies, emitted data shapes
//! - `storage`: per-instrument storage and per-collector reconciliation
//!
//! Data flows observation callback → [`AsyncMetricStorage::record_long`] /
//! [`AsyncMetricStorage::record_double`] (diff against the last absolute
//! value, under one lock) → [`AsyncMetricStorage::collect`] (atomic delta
//! drain) → [`TemporalMetricStorage`] (per-collector merge, report, reset)
//! → sink callback.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::SystemTime;
//! use omet::core::{InstrumentDescriptor, InstrumentKind, InstrumentValueType, Temporality};
//! use omet::metrics::AttributeSet;
//! use omet::storage::{AsyncMetricStorage, CollectorHandle, CollectorId, SimpleCollector};
//!
//! let descriptor = InstrumentDescriptor::new(
//!     "requests_total",
//!     InstrumentKind::Counter,
//!     InstrumentValueType::Long,
//! );
//! let storage = AsyncMetricStorage::with_default_aggregation(descriptor);
//!
//! let reader: Arc<dyn CollectorHandle> =
//!     Arc::new(SimpleCollector::new(CollectorId::new(1), Temporality::Delta));
//! let roster = vec![Arc::clone(&reader)];
//!
//! let attrs: AttributeSet = [("route", "/api")].into_iter().collect();
//! let start = SystemTime::now();
//! storage.record_long(&[(attrs, 42)], start);
//!
//! storage.collect(reader.as_ref(), &roster, start, SystemTime::now(), |data| {
//!     assert_eq!(data.points.len(), 1);
//!     true
//! });
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod metrics;
pub mod storage;

// Re-export the types embedders touch most often.
pub use crate::core::{MetricError, Result, Temporality};
pub use crate::metrics::{Aggregation, AggregationKind, AttributeSet, MetricData};
pub use crate::storage::{AsyncMetricStorage, CollectorHandle, TemporalMetricStorage};
