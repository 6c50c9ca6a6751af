use std::time::Duration;

use async_trait::async_trait;
use herald_common::Message;
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::{ProviderError, ProviderOutcome};

/// Settings for one [`MockProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockProviderConfig {
    pub name: String,

    /// Probability in `[0, 1]` that a send is refused.
    ///
    /// Default: 0.5
    #[serde(default = "defaults::failure_rate")]
    pub failure_rate: f64,

    /// Simulated network latency per send (in milliseconds).
    ///
    /// Default: 100
    #[serde(default = "defaults::latency_ms")]
    pub latency_ms: u64,
}

impl MockProviderConfig {
    /// The pair of providers used when none are configured
    #[must_use]
    pub fn default_pair() -> Vec<Self> {
        vec![
            Self {
                name: "MockProvider1".to_string(),
                failure_rate: 0.7,
                latency_ms: defaults::latency_ms(),
            },
            Self {
                name: "MockProvider2".to_string(),
                failure_rate: 0.4,
                latency_ms: defaults::latency_ms(),
            },
        ]
    }
}

mod defaults {
    pub const fn failure_rate() -> f64 {
        0.5
    }

    pub const fn latency_ms() -> u64 {
        100
    }
}

/// Provider that pretends to deliver, refusing a fraction of sends at random.
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    failure_rate: f64,
    latency: Duration,
}

impl MockProvider {
    /// `failure_rate` is clamped into `[0, 1]`
    #[must_use]
    pub fn new(name: impl Into<String>, failure_rate: f64, latency: Duration) -> Self {
        Self {
            name: name.into(),
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    #[must_use]
    pub const fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

impl From<&MockProviderConfig> for MockProvider {
    fn from(config: &MockProviderConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.failure_rate,
            Duration::from_millis(config.latency_ms),
        )
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _message: &Message) -> Result<ProviderOutcome, ProviderError> {
        tokio::time::sleep(self.latency).await;

        if rand::random::<f64>() < self.failure_rate {
            Ok(ProviderOutcome::failed(format!(
                "{} temporarily unavailable",
                self.name
            )))
        } else {
            Ok(ProviderOutcome::delivered())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new(["user@example.com"], "Subject", "Body")
    }

    #[tokio::test]
    async fn test_never_fails_at_zero_rate() {
        let provider = MockProvider::new("Reliable", 0.0, Duration::ZERO);
        for _ in 0..50 {
            let outcome = provider.send(&message()).await.expect("mock never faults");
            assert!(outcome.success);
        }
    }

    #[tokio::test]
    async fn test_always_fails_at_full_rate() {
        let provider = MockProvider::new("Broken", 1.0, Duration::ZERO);
        let outcome = provider.send(&message()).await.expect("mock never faults");

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Broken temporarily unavailable")
        );
    }

    #[test]
    fn test_failure_rate_clamped() {
        assert!((MockProvider::new("a", 3.0, Duration::ZERO).failure_rate() - 1.0).abs() < f64::EPSILON);
        assert!(MockProvider::new("b", -1.0, Duration::ZERO).failure_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_pair() {
        let pair = MockProviderConfig::default_pair();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0].name, "MockProvider1");
        assert!((pair[0].failure_rate - 0.7).abs() < f64::EPSILON);
        assert_eq!(pair[1].name, "MockProvider2");
        assert!((pair[1].failure_rate - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_defaults() {
        let config: MockProviderConfig =
            ron::from_str(r#"(name: "Primary")"#).expect("config should deserialize");
        let provider = MockProvider::from(&config);

        assert_eq!(provider.name(), "Primary");
        assert_eq!(config.latency_ms, 100);
        assert!((provider.failure_rate() - 0.5).abs() < f64::EPSILON);
    }
}
