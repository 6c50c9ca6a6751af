//! Error types for admission operations.
//!
//! Callers must be able to tell a store that could not be reached apart from
//! every other failure, since an unreachable store says nothing about whether
//! a message was already admitted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The backing store could not be reached (connection refused, dropped, timed out).
    #[error("Admission store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but with something other than what was asked for.
    #[error("Admission store error: {0}")]
    Store(String),

    /// Invalid admission configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AdmissionError {
    /// Returns `true` if the store itself could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Specialized `Result` type for admission operations.
pub type Result<T> = std::result::Result<T, AdmissionError>;

#[cfg(feature = "redis")]
impl From<redis::RedisError> for AdmissionError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_io_error()
            || error.is_connection_refusal()
            || error.is_connection_dropped()
            || error.is_timeout()
        {
            Self::Unavailable(error.to_string())
        } else {
            Self::Store(error.to_string())
        }
    }
}
