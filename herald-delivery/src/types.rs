use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `final_provider` reported when the admission gate suppressed a duplicate
pub const IDEMPOTENCY_CHECK_PROVIDER: &str = "IdempotencyCheck";

/// `final_provider` reported when every provider was exhausted
pub const NO_PROVIDER: &str = "None";

/// Raw result of a single provider send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderOutcome {
    #[must_use]
    pub const fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// One physical send against a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub provider: String,
    /// 1-based attempt number against `provider`
    pub attempt_number: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the send completed
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    /// Record `outcome`, stamped with the current time
    #[must_use]
    pub fn new(provider: impl Into<String>, attempt_number: u32, outcome: ProviderOutcome) -> Self {
        Self {
            provider: provider.into(),
            attempt_number,
            success: outcome.success,
            error: outcome.error,
            timestamp: Utc::now(),
        }
    }
}

/// What happened to one `send_email` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub overall_success: bool,
    /// The provider that accepted the message, or one of [`NO_PROVIDER`]
    /// and [`IDEMPOTENCY_CHECK_PROVIDER`]
    pub final_provider: String,
    /// Every attempt, ordered by provider priority then attempt number
    pub attempts: Vec<AttemptRecord>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryResult {
    /// A duplicate suppressed by the admission gate, reported as success
    #[must_use]
    pub fn duplicate() -> Self {
        Self {
            overall_success: true,
            final_provider: IDEMPOTENCY_CHECK_PROVIDER.to_string(),
            attempts: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn succeeded(provider: impl Into<String>, attempts: Vec<AttemptRecord>) -> Self {
        Self {
            overall_success: true,
            final_provider: provider.into(),
            attempts,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn exhausted(attempts: Vec<AttemptRecord>) -> Self {
        Self {
            overall_success: false,
            final_provider: NO_PROVIDER.to_string(),
            attempts,
            timestamp: Utc::now(),
        }
    }

    /// Whether the admission gate short-circuited this call
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.final_provider == IDEMPOTENCY_CHECK_PROVIDER && self.attempts.is_empty()
    }
}
