//! Aggregation policies and their running per-stream state.
//!
//! One [`Aggregation`] instance holds the statistical state of a single
//! attribute set under a single policy. The full capability set is
//! `aggregate` (fold a raw measurement in), `diff` (incremental
//! contribution since a prior snapshot, the bridge from absolute
//! observations to delta semantics), `merge` (additive combination used by
//! the temporal layer), and `Clone`. Two aggregations of different policy
//! are never diffed or merged.

use crate::core::error::{MetricError, Result};
use crate::core::types::{InstrumentDescriptor, InstrumentKind, InstrumentValueType, Number};
use crate::metrics::data::{HistogramPoint, PointValue};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// OTel-standard default histogram bucket boundaries.
static DEFAULT_BOUNDARIES: Lazy<Arc<[f64]>> = Lazy::new(|| {
    Arc::from(
        [
            0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0,
            5000.0, 7500.0, 10000.0,
        ]
        .as_slice(),
    )
});

/// The aggregation policy applied to an instrument's measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationKind {
    /// Discard every measurement; produces no output.
    Drop,
    /// Running sum, monotonic or not per the descriptor.
    Sum,
    /// Most recent measurement only.
    LastValue,
    /// Bucketed distribution with sum, count, min and max.
    Histogram,
}

impl AggregationKind {
    /// The default policy for an instrument kind, mirroring the SDK's
    /// standard selection.
    pub fn default_for(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Counter | InstrumentKind::UpDownCounter => Self::Sum,
            InstrumentKind::Gauge => Self::LastValue,
            InstrumentKind::Histogram => Self::Histogram,
        }
    }
}

/// Policy configuration supplied at storage construction.
///
/// Currently this carries the histogram bucket boundaries; other policies
/// need no configuration.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    boundaries: Arc<[f64]>,
}

impl AggregationConfig {
    /// Builds a config with explicit histogram boundaries, which must be
    /// finite and strictly ascending.
    pub fn with_boundaries(boundaries: Vec<f64>) -> Result<Self> {
        for window in boundaries.windows(2) {
            if window[0] >= window[1] {
                return Err(MetricError::invalid_boundaries(format!(
                    "{} does not precede {}",
                    window[0], window[1]
                )));
            }
        }
        if boundaries.iter().any(|b| !b.is_finite()) {
            return Err(MetricError::invalid_boundaries("boundaries must be finite"));
        }
        Ok(Self {
            boundaries: Arc::from(boundaries.as_slice()),
        })
    }

    /// The histogram bucket boundaries.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            boundaries: Arc::clone(&DEFAULT_BOUNDARIES),
        }
    }
}

/// Running aggregation state for one attribute set under one policy.
#[derive(Debug, Clone)]
pub enum Aggregation {
    /// No-op policy; all operations do nothing and no point is emitted.
    Drop,
    /// Running sum.
    Sum {
        /// The accumulated value.
        value: Number,
        /// Whether the sum only ever grows (from the descriptor).
        monotonic: bool,
    },
    /// Most recent measurement, `None` before the first.
    LastValue {
        /// The last recorded value, if any.
        value: Option<Number>,
    },
    /// Bucketed distribution.
    Histogram(HistogramState),
}

impl Aggregation {
    /// Default-constructs the state for a policy and descriptor.
    pub fn new(
        kind: AggregationKind,
        descriptor: &InstrumentDescriptor,
        config: &AggregationConfig,
    ) -> Self {
        match kind {
            AggregationKind::Drop => Self::Drop,
            AggregationKind::Sum => Self::Sum {
                value: Number::zero(descriptor.value_type()),
                monotonic: descriptor.is_monotonic(),
            },
            AggregationKind::LastValue => Self::LastValue { value: None },
            AggregationKind::Histogram => Self::Histogram(HistogramState::new(
                Arc::clone(&config.boundaries),
                descriptor.value_type(),
            )),
        }
    }

    /// The policy this state belongs to.
    pub fn kind(&self) -> AggregationKind {
        match self {
            Self::Drop => AggregationKind::Drop,
            Self::Sum { .. } => AggregationKind::Sum,
            Self::LastValue { .. } => AggregationKind::LastValue,
            Self::Histogram(_) => AggregationKind::Histogram,
        }
    }

    /// Folds one raw measurement into the state.
    pub fn aggregate(&mut self, measurement: Number) {
        match self {
            Self::Drop => {},
            Self::Sum { value, .. } => *value = value.add(measurement),
            Self::LastValue { value } => *value = Some(measurement),
            Self::Histogram(state) => state.record(measurement),
        }
    }

    /// The incremental contribution of `newer` since `self`.
    ///
    /// Defined for the same policy only; a policy mismatch is a
    /// programming error and yields `None`.
    pub fn diff(&self, newer: &Aggregation) -> Option<Aggregation> {
        match (self, newer) {
            (Self::Drop, Self::Drop) => Some(Self::Drop),
            (
                Self::Sum { value: prev, monotonic },
                Self::Sum { value: next, .. },
            ) => Some(Self::Sum {
                value: next.sub(*prev),
                monotonic: *monotonic,
            }),
            // The delta of a gauge reading is simply the newer reading.
            (Self::LastValue { .. }, Self::LastValue { value }) => {
                Some(Self::LastValue { value: *value })
            },
            (Self::Histogram(prev), Self::Histogram(next)) => {
                Some(Self::Histogram(prev.diff(next)))
            },
            _ => {
                debug_assert!(false, "diff across aggregation policies");
                None
            },
        }
    }

    /// Additively combines `other` into `self` (same policy only).
    pub fn merge(&mut self, other: &Aggregation) {
        match (self, other) {
            (Self::Drop, Self::Drop) => {},
            (Self::Sum { value, .. }, Self::Sum { value: rhs, .. }) => {
                *value = value.add(*rhs);
            },
            (Self::LastValue { value }, Self::LastValue { value: rhs }) => {
                if rhs.is_some() {
                    *value = *rhs;
                }
            },
            (Self::Histogram(state), Self::Histogram(rhs)) => state.merge(rhs),
            _ => debug_assert!(false, "merge across aggregation policies"),
        }
    }

    /// Converts the state into an emittable point value. `Drop` and a
    /// never-written `LastValue` produce nothing.
    pub fn to_point(&self) -> Option<PointValue> {
        match self {
            Self::Drop => None,
            Self::Sum { value, .. } => Some(PointValue::Sum(*value)),
            Self::LastValue { value } => value.map(PointValue::LastValue),
            Self::Histogram(state) => Some(PointValue::Histogram(state.to_point())),
        }
    }
}

/// Bucketed distribution state.
#[derive(Debug, Clone)]
pub struct HistogramState {
    boundaries: Arc<[f64]>,
    counts: Vec<u64>,
    sum: Number,
    count: u64,
    min: Option<Number>,
    max: Option<Number>,
}

impl HistogramState {
    fn new(boundaries: Arc<[f64]>, value_type: InstrumentValueType) -> Self {
        let buckets = boundaries.len() + 1;
        Self {
            boundaries,
            counts: vec![0; buckets],
            sum: Number::zero(value_type),
            count: 0,
            min: None,
            max: None,
        }
    }

    /// Index of the bucket a value falls into: the first boundary the
    /// value does not exceed, or the overflow bucket.
    fn bucket_index(&self, value: f64) -> usize {
        self.boundaries
            .iter()
            .position(|b| value <= *b)
            .unwrap_or(self.boundaries.len())
    }

    fn record(&mut self, measurement: Number) {
        let idx = self.bucket_index(measurement.as_f64());
        self.counts[idx] += 1;
        self.sum = self.sum.add(measurement);
        self.count += 1;
        if self.min.map_or(true, |m| measurement.lt(m)) {
            self.min = Some(measurement);
        }
        if self.max.map_or(true, |m| m.lt(measurement)) {
            self.max = Some(measurement);
        }
    }

    fn merge(&mut self, other: &HistogramState) {
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
        self.sum = self.sum.add(other.sum);
        self.count += other.count;
        if let Some(rhs) = other.min {
            if self.min.map_or(true, |m| rhs.lt(m)) {
                self.min = Some(rhs);
            }
        }
        if let Some(rhs) = other.max {
            if self.max.map_or(true, |m| m.lt(rhs)) {
                self.max = Some(rhs);
            }
        }
    }

    /// `newer - self`: per-bucket and total differences. Min/max of the
    /// increment are not recoverable from two snapshots, so the newer
    /// snapshot's values carry over.
    fn diff(&self, newer: &HistogramState) -> HistogramState {
        debug_assert_eq!(self.counts.len(), newer.counts.len());
        let counts = newer
            .counts
            .iter()
            .zip(&self.counts)
            .map(|(next, prev)| next.saturating_sub(*prev))
            .collect();
        HistogramState {
            boundaries: Arc::clone(&newer.boundaries),
            counts,
            sum: newer.sum.sub(self.sum),
            count: newer.count.saturating_sub(self.count),
            min: newer.min,
            max: newer.max,
        }
    }

    fn to_point(&self) -> HistogramPoint {
        HistogramPoint {
            boundaries: self.boundaries.to_vec(),
            counts: self.counts.clone(),
            sum: self.sum,
            count: self.count,
            min: self.min,
            max: self.max,
        }
    }
}
