//! Attribute sets, aggregation policies, and emitted data shapes.
//!
//! - [`AttributeSet`]: the content-hashed dimensional key of one stream
//! - [`Aggregation`]: running per-stream state under one policy
//! - [`MetricData`]: the collector-scoped output of a collection cycle

#![warn(missing_docs)]

pub mod aggregate;
pub mod attributes;
pub mod data;

pub use aggregate::{Aggregation, AggregationConfig, AggregationKind};
pub use attributes::{AttributeSet, AttributeValue};
pub use data::{HistogramPoint, MetricData, MetricPoint, PointValue};
