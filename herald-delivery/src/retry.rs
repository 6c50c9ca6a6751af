//! Bounded retries against a single provider.
//!
//! Attempts run strictly one after another. After failed attempt `n` the
//! controller waits `base_delay * 2^n` before trying again; no delay follows
//! the last attempt, successful or not.

use std::{sync::Arc, time::Duration};

use herald_common::{Message, audit, internal};

use crate::{
    AttemptExecutor, AttemptRecord, DeliveryConfig, DeliveryError, ProviderOutcome,
    provider::Provider, sleeper::Sleeper,
};

/// Result of driving one provider through its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    /// The successful outcome, or a summary of why this provider gave up
    pub outcome: ProviderOutcome,
    /// One record per physical send, in order
    pub records: Vec<AttemptRecord>,
}

#[derive(Clone)]
pub struct RetryController {
    executor: AttemptExecutor,
    max_retries: u32,
    base_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("executor", &self.executor)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("sleeper", &"<sleeper>")
            .finish()
    }
}

impl RetryController {
    /// # Errors
    /// Returns [`DeliveryError::Configuration`] if `config` fails validation.
    pub fn new(config: &DeliveryConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, DeliveryError> {
        config.validate()?;

        Ok(Self {
            executor: AttemptExecutor::new(config.call_timeout()),
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            sleeper,
        })
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay inserted after failed attempt `attempt` (1-based)
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Try `provider` up to `max_retries` times, stopping at the first success.
    ///
    /// Each send is audited under `message_key` as soon as it completes.
    /// When every attempt fails the returned outcome is a synthetic summary;
    /// it is not added to `records`, which only ever holds real sends.
    pub async fn send_with_retry(
        &self,
        provider: &dyn Provider,
        message: &Message,
        message_key: &str,
    ) -> RetryOutcome {
        let mut records = Vec::with_capacity(self.max_retries as usize);

        for attempt in 1..=self.max_retries {
            let record = self.executor.attempt(provider, message, attempt).await;
            audit::log_delivery_attempt(
                message_key,
                &record.provider,
                record.attempt_number,
                record.success,
                record.error.as_deref(),
            );
            let success = record.success;
            let error = record.error.clone();
            records.push(record);

            if success {
                internal!(level = INFO, "Message sent with provider {}", provider.name());
                return RetryOutcome {
                    outcome: ProviderOutcome::delivered(),
                    records,
                };
            }

            tracing::warn!(
                provider = provider.name(),
                attempt,
                error = error.as_deref().unwrap_or_default(),
                "Delivery attempt failed"
            );

            if attempt < self.max_retries {
                let delay = self.backoff_delay(attempt);
                internal!(
                    "Retrying {} in {}ms",
                    provider.name(),
                    delay.as_millis()
                );
                self.sleeper.sleep(delay).await;
            }
        }

        RetryOutcome {
            outcome: ProviderOutcome::failed(format!(
                "All {} attempts failed with provider: {}",
                self.max_retries,
                provider.name()
            )),
            records,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{InstantSleeper, ProviderError, RecordingSleeper, ScriptedProvider};

    const KEY: &str = "idempotency:test";

    fn message() -> Message {
        Message::new(["user@example.com"], "Subject", "Body")
    }

    fn controller(max_retries: u32, sleeper: Arc<dyn Sleeper>) -> RetryController {
        let config = DeliveryConfig {
            max_retries,
            ..DeliveryConfig::default()
        };
        RetryController::new(&config, sleeper).expect("config should be valid")
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = DeliveryConfig {
            max_retries: 0,
            ..DeliveryConfig::default()
        };
        let result = RetryController::new(&config, Arc::new(InstantSleeper));
        assert!(result.is_err_and(|e| e.is_configuration()));
    }

    #[test]
    fn test_backoff_delays() {
        let controller = controller(4, Arc::new(InstantSleeper));

        assert_eq!(controller.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(controller.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(controller.backoff_delay(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_saturates() {
        let controller = controller(2, Arc::new(InstantSleeper));
        assert_eq!(controller.backoff_delay(64), Duration::from_millis(100).saturating_mul(u32::MAX));
    }

    #[tokio::test]
    async fn test_first_attempt_success_has_no_delay() {
        let sleeper = RecordingSleeper::new();
        let controller = controller(2, Arc::new(sleeper.clone()));
        let provider = ScriptedProvider::succeeding("Primary");

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert!(outcome.outcome.success);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_success_on_second_attempt() {
        let sleeper = RecordingSleeper::new();
        let controller = controller(2, Arc::new(sleeper.clone()));
        let provider = ScriptedProvider::failing_then_succeeding("Flaky", 1);

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert!(outcome.outcome.success);
        let numbers: Vec<u32> = outcome.records.iter().map(|r| r.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(!outcome.records[0].success);
        assert!(outcome.records[1].success);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(200)]);
    }

    #[tokio::test]
    async fn test_exhaustion_summary_not_recorded() {
        let sleeper = RecordingSleeper::new();
        let controller = controller(2, Arc::new(sleeper.clone()));
        let provider = ScriptedProvider::failing("Broken");

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert!(!outcome.outcome.success);
        assert_eq!(
            outcome.outcome.error.as_deref(),
            Some("All 2 attempts failed with provider: Broken")
        );
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| {
            r.error.as_deref() == Some("Broken temporarily unavailable")
        }));
        assert_eq!(provider.calls(), 2);
        // Only the gap between the two attempts, nothing after the last
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(200)]);
    }

    #[tokio::test]
    async fn test_longer_retry_schedule() {
        let sleeper = RecordingSleeper::new();
        let controller = controller(4, Arc::new(sleeper.clone()));
        let provider = ScriptedProvider::failing("Broken");

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_attempt_never_sleeps() {
        let sleeper = RecordingSleeper::new();
        let controller = controller(1, Arc::new(sleeper.clone()));
        let provider = ScriptedProvider::failing("Broken");

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert_eq!(outcome.records.len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_fault_is_retried_like_failure() {
        let controller = controller(2, Arc::new(InstantSleeper));
        let provider = ScriptedProvider::new(
            "Faulty",
            [
                Err(ProviderError::Internal("boom".to_string())),
                Ok(ProviderOutcome::delivered()),
            ],
        );

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert!(outcome.outcome.success);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.records[0].error.as_deref(),
            Some("Internal error: boom")
        );
    }

    /// Shared timeline of audited attempts and backoff sleeps
    #[derive(Clone, Default)]
    struct Timeline(Arc<parking_lot::Mutex<Vec<String>>>);

    impl Timeline {
        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl Sleeper for Timeline {
        async fn sleep(&self, _duration: Duration) {
            self.0.lock().push("sleep".to_string());
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Timeline {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            #[derive(Default)]
            struct AttemptFields {
                is_attempt: bool,
                attempt: u64,
            }

            impl tracing::field::Visit for AttemptFields {
                fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                    if field.name() == "event" && value == "DeliveryAttempt" {
                        self.is_attempt = true;
                    }
                }

                fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
                    if field.name() == "delivery_attempt" {
                        self.attempt = value;
                    }
                }

                fn record_debug(&mut self, _: &tracing::field::Field, _: &dyn std::fmt::Debug) {}
            }

            let mut fields = AttemptFields::default();
            event.record(&mut fields);
            if fields.is_attempt {
                self.0.lock().push(format!("attempt {}", fields.attempt));
            }
        }
    }

    #[tokio::test]
    async fn test_attempts_audited_as_they_happen() {
        use tracing_subscriber::layer::SubscriberExt;

        let timeline = Timeline::default();
        let subscriber = tracing_subscriber::registry().with(timeline.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let controller = controller(3, Arc::new(timeline.clone()));
        let provider = ScriptedProvider::failing_then_succeeding("Flaky", 2);

        let outcome = controller.send_with_retry(&provider, &message(), KEY).await;

        assert!(outcome.outcome.success);
        assert_eq!(
            timeline.entries(),
            vec!["attempt 1", "sleep", "attempt 2", "sleep", "attempt 3"]
        );
    }
}
