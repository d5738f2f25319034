//! Error types for the attribution layer
//!
//! Parsing of whole attribution lines never fails loudly (it yields `None`);
//! these errors cover the typed boundary conversions only.

/// Errors converting wire text into attribution values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributionError {
    /// Token does not match `S<n>` or `U<n>`
    #[error("invalid source id token: '{0}'")]
    InvalidSourceId(String),

    /// Index digits do not fit the index type
    #[error("source id index out of range: '{0}'")]
    IndexOutOfRange(String),
}

/// Result type alias for attribution conversions
pub type AttributionResult<T> = Result<T, AttributionError>;
