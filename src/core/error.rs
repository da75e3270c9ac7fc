use thiserror::Error;

/// Errors surfaced by fallible construction paths.
///
/// The hot record/collect paths never return these: per the fail-open
/// policy, a mistyped observation batch is silently dropped and sink
/// rejection is reported as a plain `bool` from `collect`.
#[derive(Error, Debug)]
pub enum MetricError {
    /// An attribute key or value failed validation.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Histogram bucket boundaries were not finite and strictly ascending.
    #[error("invalid histogram boundaries: {0}")]
    InvalidBoundaries(String),

    /// An instrument descriptor field failed validation.
    #[error("invalid instrument descriptor: {0}")]
    InvalidDescriptor(String),

    /// An aggregation configuration value was out of range.
    #[error("invalid aggregation config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for omet operations.
pub type Result<T> = std::result::Result<T, MetricError>;

impl MetricError {
    /// Creates a new attribute validation error.
    pub fn invalid_attribute<S: Into<String>>(msg: S) -> Self {
        Self::InvalidAttribute(msg.into())
    }

    /// Creates a new boundary validation error.
    pub fn invalid_boundaries<S: Into<String>>(msg: S) -> Self {
        Self::InvalidBoundaries(msg.into())
    }

    /// Creates a new descriptor validation error.
    pub fn invalid_descriptor<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Creates a new configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns the error category for metrics/logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidAttribute(_) => "attribute",
            Self::InvalidBoundaries(_) | Self::InvalidConfig(_) => "config",
            Self::InvalidDescriptor(_) => "descriptor",
        }
    }
}
