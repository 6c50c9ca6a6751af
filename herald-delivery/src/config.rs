use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DeliveryError;

/// Retry and timeout settings applied to every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Attempts made against each provider before falling back to the next.
    ///
    /// Each extra attempt raises the chance of delivery, and adds one more
    /// call plus one more backoff to the worst-case latency of every provider.
    ///
    /// Default: 2
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff (in milliseconds).
    ///
    /// The delay after failed attempt `n` is `base * 2^n`, so the default
    /// waits 200ms after the first failure.
    ///
    /// Default: 100
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on a single provider call (in milliseconds).
    ///
    /// A call that runs longer is recorded as a failed attempt.
    ///
    /// Default: 10000 (10 seconds)
    #[serde(default = "defaults::call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_delay_ms: defaults::base_delay_ms(),
            call_timeout_ms: defaults::call_timeout_ms(),
        }
    }
}

impl DeliveryConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// # Errors
    /// Returns [`DeliveryError::Configuration`] if `max_retries` or
    /// `call_timeout_ms` is zero.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.max_retries == 0 {
            return Err(DeliveryError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(DeliveryError::Configuration(
                "call_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        2
    }

    pub const fn base_delay_ms() -> u64 {
        100
    }

    pub const fn call_timeout_ms() -> u64 {
        10_000 // 10 seconds
    }
}
