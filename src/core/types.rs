use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of instrument a storage aggregates for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Monotonically increasing counter (requests, bytes sent).
    Counter,
    /// Counter that may also decrease (queue depth, active connections).
    UpDownCounter,
    /// Point-in-time measurement (CPU usage, temperature).
    Gauge,
    /// Value distribution (latency, payload size).
    Histogram,
}

/// The declared numeric type of an instrument's measurements.
///
/// Integer measurements use integer arithmetic throughout; an observation
/// batch of the wrong type is dropped before it touches any map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentValueType {
    /// 64-bit signed integer measurements.
    Long,
    /// 64-bit floating-point measurements.
    Double,
}

/// Whether a collector receives deltas since its last report or running
/// totals since SDK start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Temporality {
    /// Measurements from one collection cycle are reported independently.
    Delta,
    /// Each report covers the whole interval since SDK start.
    Cumulative,
}

/// Immutable description of one instrument, fixed at storage construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    name: String,
    description: String,
    unit: String,
    kind: InstrumentKind,
    value_type: InstrumentValueType,
    monotonic: bool,
}

impl InstrumentDescriptor {
    /// Creates a descriptor. Monotonicity follows the instrument kind:
    /// counters and histograms accumulate monotonically, up-down counters
    /// and gauges do not.
    pub fn new(
        name: impl Into<String>,
        kind: InstrumentKind,
        value_type: InstrumentValueType,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            unit: String::new(),
            kind,
            value_type,
            monotonic: matches!(kind, InstrumentKind::Counter | InstrumentKind::Histogram),
        }
    }

    /// Sets the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the unit string.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// The instrument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human-readable description, empty if unset.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The unit string, empty if unset.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The instrument kind.
    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    /// The declared measurement value type.
    pub fn value_type(&self) -> InstrumentValueType {
        self.value_type
    }

    /// Whether the instrument's running value only ever grows.
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }
}

impl fmt::Display for InstrumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}/{:?})", self.name, self.kind, self.value_type)
    }
}

/// A tagged measurement value.
///
/// `Long` stays integral through every aggregation step; `Double` follows
/// standard IEEE arithmetic with NaN/Inf passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    /// Integer measurement.
    Long(i64),
    /// Floating-point measurement.
    Double(f64),
}

impl Number {
    /// The zero value of the given type.
    pub fn zero(value_type: InstrumentValueType) -> Self {
        match value_type {
            InstrumentValueType::Long => Number::Long(0),
            InstrumentValueType::Double => Number::Double(0.0),
        }
    }

    /// Sum of two numbers of the same kind. Mixed kinds cannot occur for
    /// one instrument; they promote to double.
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Long(a), Number::Long(b)) => Number::Long(a.saturating_add(b)),
            (Number::Double(a), Number::Double(b)) => Number::Double(a + b),
            (a, b) => Number::Double(a.as_f64() + b.as_f64()),
        }
    }

    /// Difference `self - other` of two numbers of the same kind.
    pub fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Long(a), Number::Long(b)) => Number::Long(a.saturating_sub(b)),
            (Number::Double(a), Number::Double(b)) => Number::Double(a - b),
            (a, b) => Number::Double(a.as_f64() - b.as_f64()),
        }
    }

    /// Lossy conversion to `f64` (exact for `Double`).
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Long(v) => v as f64,
            Number::Double(v) => v,
        }
    }

    /// The integer payload, if this is a `Long`.
    pub fn as_long(self) -> Option<i64> {
        match self {
            Number::Long(v) => Some(v),
            Number::Double(_) => None,
        }
    }

    /// Whether `self < other`, comparing within the same kind.
    pub fn lt(self, other: Number) -> bool {
        match (self, other) {
            (Number::Long(a), Number::Long(b)) => a < b,
            (a, b) => a.as_f64() < b.as_f64(),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Long(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Double(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Long(v) => write!(f, "{}", v),
            Number::Double(v) => write!(f, "{}", v),
        }
    }
}
