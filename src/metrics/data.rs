//! Collector-scoped output shapes of a collection cycle.

use crate::core::types::{InstrumentDescriptor, Number, Temporality};
use crate::metrics::attributes::AttributeSet;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// The value of one emitted point, shaped by the aggregation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointValue {
    /// Sum policy output.
    Sum(Number),
    /// Last-value policy output.
    LastValue(Number),
    /// Histogram policy output.
    Histogram(HistogramPoint),
}

impl PointValue {
    /// The integer payload of a scalar point, if any.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Sum(n) | Self::LastValue(n) => n.as_long(),
            Self::Histogram(_) => None,
        }
    }

    /// The scalar payload as `f64`, if this is not a histogram.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Sum(n) | Self::LastValue(n) => Some(n.as_f64()),
            Self::Histogram(_) => None,
        }
    }
}

/// Emitted histogram distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    /// Bucket upper bounds; `counts` has one extra overflow bucket.
    pub boundaries: Vec<f64>,
    /// Per-bucket observation counts.
    pub counts: Vec<u64>,
    /// Sum of all observations.
    pub sum: Number,
    /// Total observation count.
    pub count: u64,
    /// Smallest observation, if any were recorded.
    pub min: Option<Number>,
    /// Largest observation, if any were recorded.
    pub max: Option<Number>,
}

/// One (attribute set, value) pair of an emitted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// The stream's dimensional key.
    pub attributes: AttributeSet,
    /// The aggregated value.
    pub value: PointValue,
}

/// One collector's view of an instrument for one collection cycle.
///
/// Value interpretation (delta vs running total) is fixed by
/// `temporality`; the covering interval is `[start_time, end_time]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    /// The instrument the points belong to.
    pub descriptor: InstrumentDescriptor,
    /// The invoking collector's declared temporality.
    pub temporality: Temporality,
    /// Interval start: SDK start for cumulative, the collector's previous
    /// collection for delta.
    pub start_time: SystemTime,
    /// The collection timestamp.
    pub end_time: SystemTime,
    /// One point per attribute set with unreported state this cycle.
    pub points: Vec<MetricPoint>,
}

impl MetricData {
    /// Looks up the point for an attribute set, if present this cycle.
    pub fn point(&self, attributes: &AttributeSet) -> Option<&PointValue> {
        self.points
            .iter()
            .find(|p| &p.attributes == attributes)
            .map(|p| &p.value)
    }
}
