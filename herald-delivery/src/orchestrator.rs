//! Provider fallback orchestration
//!
//! # State Transitions
//!
//! ```text
//! ┌───────────┐ duplicate  ┌──────────────────────────┐
//! │ Admitting │ ─────────> │ done ("IdempotencyCheck") │
//! └───────────┘            └──────────────────────────┘
//!       │ new
//!       v
//! ┌────────────────────┐  provider i exhausted, i + 1 < N
//! │ TryingProvider(i)  │ ──────────────────────────────┐
//! └────────────────────┘ <─────────────────────────────┘
//!       │ success               │ last provider exhausted
//!       v                       v
//! ┌───────────────┐      ┌───────────┐
//! │ Succeeded(i)  │      │ Exhausted │ ── release claim
//! └───────────────┘      └───────────┘
//! ```
//!
//! Providers are tried strictly in the order supplied; there is no fan-out.

use std::sync::Arc;

use herald_admission::AdmissionGate;
use herald_common::{Message, audit, internal};

use crate::{
    DeliveryConfig, DeliveryError, DeliveryResult, RetryController,
    provider::Provider,
    sleeper::{Sleeper, TokioSleeper},
};

/// Where a single `send_email` call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Claiming the message with the admission gate
    Admitting,
    /// Retrying the provider at this index
    TryingProvider(usize),
    /// The provider at this index accepted the message
    Succeeded(usize),
    /// Every provider gave up
    Exhausted,
}

/// Delivers each admitted message through the first provider willing to take it.
pub struct DeliveryOrchestrator {
    providers: Vec<Arc<dyn Provider>>,
    gate: AdmissionGate,
    retry: RetryController,
}

impl std::fmt::Debug for DeliveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryOrchestrator")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("gate", &self.gate)
            .field("retry", &self.retry)
            .finish()
    }
}

impl DeliveryOrchestrator {
    /// Build an orchestrator that backs off on the tokio timer.
    ///
    /// `providers` is a priority list: earlier entries are always tried first.
    ///
    /// # Errors
    /// Returns [`DeliveryError::Configuration`] if `providers` is empty or
    /// `config` is invalid.
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        gate: AdmissionGate,
        config: &DeliveryConfig,
    ) -> Result<Self, DeliveryError> {
        Self::with_sleeper(providers, gate, config, Arc::new(TokioSleeper))
    }

    /// Build an orchestrator with an explicit backoff [`Sleeper`].
    ///
    /// # Errors
    /// Returns [`DeliveryError::Configuration`] if `providers` is empty or
    /// `config` is invalid.
    pub fn with_sleeper(
        providers: Vec<Arc<dyn Provider>>,
        gate: AdmissionGate,
        config: &DeliveryConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, DeliveryError> {
        if providers.is_empty() {
            return Err(DeliveryError::Configuration(
                "at least one provider is required".to_string(),
            ));
        }

        let retry = RetryController::new(config, sleeper)?;

        Ok(Self {
            providers,
            gate,
            retry,
        })
    }

    /// Provider names in priority order
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    #[must_use]
    pub const fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Deliver `message` through the first provider that accepts it.
    ///
    /// A duplicate of a message admitted within the admission window is
    /// reported as a success from `"IdempotencyCheck"` without contacting any
    /// provider. If every provider gives up the claim is released, so the same
    /// message can be resubmitted straight away, and the result carries
    /// `overall_success == false`.
    ///
    /// # Errors
    /// Returns [`DeliveryError::Admission`] if the admission store fails while
    /// claiming or releasing. A claim failure leaves the claim untouched, since
    /// its state is unknown.
    pub async fn send_email(&self, message: &Message) -> Result<DeliveryResult, DeliveryError> {
        let key = self.gate.key(message);
        let mut attempts = Vec::new();
        let mut state = DeliveryState::Admitting;

        loop {
            internal!("{}: {:?}", key, state);

            state = match state {
                DeliveryState::Admitting => {
                    if !self.gate.claim(message).await? {
                        audit::log_duplicate_suppressed(&key, message.recipients());
                        return Ok(DeliveryResult::duplicate());
                    }

                    DeliveryState::TryingProvider(0)
                }

                DeliveryState::TryingProvider(index) => {
                    let provider = &self.providers[index];
                    let outcome = self
                        .retry
                        .send_with_retry(provider.as_ref(), message, &key)
                        .await;
                    attempts.extend(outcome.records);

                    if outcome.outcome.success {
                        DeliveryState::Succeeded(index)
                    } else {
                        tracing::warn!(
                            provider = provider.name(),
                            error = outcome.outcome.error.as_deref().unwrap_or_default(),
                            "Provider exhausted, falling back"
                        );

                        if index + 1 < self.providers.len() {
                            DeliveryState::TryingProvider(index + 1)
                        } else {
                            DeliveryState::Exhausted
                        }
                    }
                }

                DeliveryState::Succeeded(index) => {
                    let provider = self.providers[index].name();
                    audit::log_delivery_success(&key, message.recipients(), provider, attempts.len());
                    return Ok(DeliveryResult::succeeded(provider, attempts));
                }

                DeliveryState::Exhausted => {
                    tracing::error!(key = %key, "All providers failed to send the message");
                    audit::log_delivery_failure(
                        &key,
                        message.recipients(),
                        self.providers.len(),
                        attempts.len(),
                    );

                    self.gate.release(message).await?;
                    return Ok(DeliveryResult::exhausted(attempts));
                }
            };
        }
    }
}
