//! Core domain types for the aggregation subsystem.
//!
//! Everything else in the crate hangs off the instrument descriptor and
//! the tagged numeric value defined here.

#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{MetricError, Result};
pub use types::{
    InstrumentDescriptor, InstrumentKind, InstrumentValueType, Number, Temporality,
};
