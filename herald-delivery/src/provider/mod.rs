//! Delivery providers
//!
//! A provider is anything that can accept a [`Message`] and say whether it
//! took it. Variants are interchangeable and chosen when the orchestrator is
//! built:
//! - [`MockProvider`]: simulated latency and a configurable failure rate
//! - [`ScriptedProvider`]: replays a fixed sequence of outcomes (testing)

mod mock;
mod scripted;

use async_trait::async_trait;
use herald_common::Message;

pub use self::mock::{MockProvider, MockProviderConfig};
pub use self::scripted::ScriptedProvider;
use crate::{ProviderError, ProviderOutcome};

#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier used in logs and attempt records
    fn name(&self) -> &str;

    /// Offer `message` to the provider.
    ///
    /// An ordinary refusal is `Ok` with `success == false`.
    ///
    /// # Errors
    /// Reserved for faults in the provider itself.
    async fn send(&self, message: &Message) -> Result<ProviderOutcome, ProviderError>;
}
