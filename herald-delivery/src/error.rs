//! Typed error handling for delivery operations.
//!
//! Only two things can make [`DeliveryOrchestrator::send_email`] fail outright:
//! - The admission store faulted, so nobody knows whether the message is new
//! - The orchestrator was built from an invalid configuration
//!
//! Provider failures never appear here; they are recorded as failed attempts.
//!
//! [`DeliveryOrchestrator::send_email`]: crate::DeliveryOrchestrator::send_email

use herald_admission::AdmissionError;
use thiserror::Error;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The admission gate could not classify or release the message.
    #[error("Admission failure: {0}")]
    Admission(#[from] AdmissionError),

    /// The orchestrator cannot be built from the supplied configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DeliveryError {
    /// Returns `true` if the admission store failed.
    #[must_use]
    pub const fn is_admission(&self) -> bool {
        matches!(self, Self::Admission(_))
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// A provider faulted instead of returning an outcome.
///
/// The executor records these as failed attempts, exactly like an ordinary
/// rejection, so retry and fallback treat every failure the same way.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Could not reach the provider.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The provider's response could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other fault inside the provider implementation.
    #[error("Internal error: {0}")]
    Internal(String),
}
