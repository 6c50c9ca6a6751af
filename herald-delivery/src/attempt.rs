use std::time::Duration;

use herald_common::{Message, outgoing};

use crate::{AttemptRecord, ProviderOutcome, provider::Provider};

/// Makes exactly one call to a provider and records what happened.
///
/// Refusals, faults and timeouts all come back as a failed [`AttemptRecord`];
/// nothing a provider does can make an attempt return an error.
#[derive(Debug, Clone, Copy)]
pub struct AttemptExecutor {
    call_timeout: Duration,
}

impl AttemptExecutor {
    #[must_use]
    pub const fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Send `message` through `provider` once, tagging the record with `attempt_number`
    pub async fn attempt(
        &self,
        provider: &dyn Provider,
        message: &Message,
        attempt_number: u32,
    ) -> AttemptRecord {
        outgoing!(
            "Sending message via {} (attempt {})",
            provider.name(),
            attempt_number
        );

        let outcome = match tokio::time::timeout(self.call_timeout, provider.send(message)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(fault)) => ProviderOutcome::failed(fault.to_string()),
            Err(_elapsed) => ProviderOutcome::failed(format!(
                "{} timed out after {}ms",
                provider.name(),
                self.call_timeout.as_millis()
            )),
        };

        AttemptRecord::new(provider.name(), attempt_number, outcome)
    }
}
