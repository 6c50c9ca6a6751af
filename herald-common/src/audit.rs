//! Audit logging for delivery lifecycle events
//!
//! Every event is a structured `tracing` event carrying an `event` field so
//! it can be filtered out of the general log stream.
//!
//! ## Audit Events
//!
//! - `DeliveryAttempt`: one physical send against a provider
//! - `DeliverySuccess`: a provider accepted the message
//! - `DeliveryFailure`: every provider exhausted its attempts
//! - `DuplicateSuppressed`: the admission gate reported a duplicate
//!
//! Recipient addresses can be redacted through [`AuditConfig`].

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Emit audit events at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replace the local part of recipient addresses with `[REDACTED]`
    #[serde(default)]
    pub redact_recipients: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_recipients: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

static AUDIT_CONFIG: OnceLock<Arc<AuditConfig>> = OnceLock::new();

/// Initialize audit logging with configuration
///
/// The first call wins; subsequent calls are ignored.
pub fn init(config: AuditConfig) {
    AUDIT_CONFIG.get_or_init(|| Arc::new(config));
}

/// Get the current audit configuration
#[must_use]
pub fn config() -> Arc<AuditConfig> {
    AUDIT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(AuditConfig::default()))
}

/// Redact email address if redaction is enabled
#[must_use]
pub fn redact_email(email: &str, redact: bool) -> String {
    if redact {
        if let Some((_, domain)) = email.split_once('@') {
            format!("[REDACTED]@{domain}")
        } else {
            "[REDACTED]".to_string()
        }
    } else {
        email.to_string()
    }
}

/// Redact multiple email addresses
#[must_use]
pub fn redact_emails(emails: &[String], redact: bool) -> Vec<String> {
    emails.iter().map(|e| redact_email(e, redact)).collect()
}

/// Log a single send against a provider.
///
/// # Fields
/// - `message_key`: admission key of the message
/// - `provider`: provider name
/// - `delivery_attempt`: attempt number against this provider (1-based)
/// - `success`: whether the provider accepted the message
/// - `error`: failure description, if any
pub fn log_delivery_attempt(
    message_key: &str,
    provider: &str,
    attempt: u32,
    success: bool,
    error: Option<&str>,
) {
    if !config().enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "DeliveryAttempt",
        message_key = %message_key,
        provider = %provider,
        delivery_attempt = attempt,
        success = success,
        error = error.unwrap_or_default(),
        "Audit: Delivery attempt"
    );
}

/// Log that a provider accepted the message.
///
/// `total_attempts` counts sends across every provider tried for this message.
pub fn log_delivery_success(
    message_key: &str,
    recipients: &[String],
    provider: &str,
    total_attempts: usize,
) {
    let config = config();
    if !config.enabled {
        return;
    }

    let redacted_recipients = redact_emails(recipients, config.redact_recipients);

    tracing::event!(
        tracing::Level::INFO,
        event = "DeliverySuccess",
        message_key = %message_key,
        recipients = ?redacted_recipients,
        recipient_count = recipients.len(),
        provider = %provider,
        total_attempts = total_attempts,
        "Audit: Delivery successful"
    );
}

/// Log that every provider was exhausted without success.
pub fn log_delivery_failure(
    message_key: &str,
    recipients: &[String],
    providers_tried: usize,
    total_attempts: usize,
) {
    let config = config();
    if !config.enabled {
        return;
    }

    let redacted_recipients = redact_emails(recipients, config.redact_recipients);

    tracing::event!(
        tracing::Level::WARN,
        event = "DeliveryFailure",
        message_key = %message_key,
        recipients = ?redacted_recipients,
        recipient_count = recipients.len(),
        providers_tried = providers_tried,
        total_attempts = total_attempts,
        "Audit: Delivery failed on every provider"
    );
}

/// Log that a message was suppressed as a duplicate by the admission gate.
pub fn log_duplicate_suppressed(message_key: &str, recipients: &[String]) {
    let config = config();
    if !config.enabled {
        return;
    }

    let redacted_recipients = redact_emails(recipients, config.redact_recipients);

    tracing::event!(
        tracing::Level::INFO,
        event = "DuplicateSuppressed",
        message_key = %message_key,
        recipients = ?redacted_recipients,
        "Audit: Duplicate message suppressed"
    );
}
