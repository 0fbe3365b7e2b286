//! Error types.
//!
//! Interval queries never fail: they report problems through
//! [`Viability`](crate::Viability) and NaN results. Errors only arise when
//! reading configuration or persisted interval records.

/// Errors from configuration loading and persisted-record decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A persisted record names an interval kind with no registered reader.
    #[error("unknown interval kind: {0}")]
    UnknownKind(String),

    /// A JSON document could not be decoded.
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A persisted record decoded but holds an unusable field value.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
