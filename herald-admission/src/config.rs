use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::AdmissionError;

/// Admission window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// How long a claim suppresses identical messages (in seconds).
    ///
    /// Raising this widens the duplicate-suppression window, at the cost of
    /// making a legitimate resubmission wait longer.
    ///
    /// Default: 600 seconds (10 minutes)
    #[serde(default = "defaults::ttl_secs")]
    pub ttl_secs: u64,

    /// Namespace prepended to every fingerprint in the store.
    ///
    /// Default: `idempotency`
    #[serde(default = "defaults::key_prefix")]
    pub key_prefix: String,

    /// Upper bound on a single store call, and on connecting to a networked
    /// store (in milliseconds).
    ///
    /// A store that does not answer in time is reported as unavailable.
    ///
    /// Default: 5000 milliseconds
    #[serde(default = "defaults::store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::ttl_secs(),
            key_prefix: defaults::key_prefix(),
            store_timeout_ms: defaults::store_timeout_ms(),
        }
    }
}

impl AdmissionConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Check the configuration can produce meaningful claims.
    ///
    /// # Errors
    /// Returns [`AdmissionError::Configuration`] for a zero TTL, an empty
    /// prefix or a zero store timeout.
    pub fn validate(&self) -> crate::Result<()> {
        if self.ttl_secs == 0 {
            return Err(AdmissionError::Configuration(
                "ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.key_prefix.is_empty() {
            return Err(AdmissionError::Configuration(
                "key_prefix must not be empty".to_string(),
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(AdmissionError::Configuration(
                "store_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod defaults {
    pub const fn ttl_secs() -> u64 {
        600 // 10 minutes
    }

    pub fn key_prefix() -> String {
        "idempotency".to_string()
    }

    pub const fn store_timeout_ms() -> u64 {
        5_000
    }
}
