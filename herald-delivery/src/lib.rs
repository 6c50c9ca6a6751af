//! Delivery engine: provider fallback with bounded retries
//!
//! This crate provides:
//! - A [`Provider`] trait for anything that can accept a message
//! - An [`AttemptExecutor`] that turns one provider call into an [`AttemptRecord`]
//! - A [`RetryController`] that retries one provider with exponential backoff
//! - A [`DeliveryOrchestrator`] that admits a message once and walks the
//!   provider list in priority order until one of them accepts it

mod attempt;
mod config;
mod error;
mod orchestrator;
pub mod provider;
mod retry;
pub mod sleeper;
mod types;

pub use attempt::AttemptExecutor;
pub use config::DeliveryConfig;
pub use error::{DeliveryError, ProviderError};
pub use orchestrator::{DeliveryOrchestrator, DeliveryState};
pub use provider::{MockProvider, MockProviderConfig, Provider, ScriptedProvider};
pub use retry::{RetryController, RetryOutcome};
pub use sleeper::{InstantSleeper, RecordingSleeper, Sleeper, TokioSleeper};
pub use types::{
    AttemptRecord, DeliveryResult, IDEMPOTENCY_CHECK_PROVIDER, NO_PROVIDER, ProviderOutcome,
};
