use std::sync::Arc;

use herald_common::{Message, internal};

use crate::{AdmissionConfig, AdmissionError, AdmissionStore, fingerprint};

/// Value written for every claim; only the key's presence is significant
const CLAIM_VALUE: &str = "processed";

/// Admission gate deciding whether a message is new within the admission window.
///
/// The gate owns no state beyond configuration: every decision is made by the
/// store's atomic set-if-absent, so gates in different processes sharing one
/// store agree with each other. Every store call is bounded by
/// [`AdmissionConfig::store_timeout`]; a call that runs over fails with
/// [`AdmissionError::Unavailable`].
#[derive(Clone)]
pub struct AdmissionGate {
    store: Arc<dyn AdmissionStore>,
    config: AdmissionConfig,
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AdmissionGate {
    /// Create a gate over `store`.
    ///
    /// # Errors
    /// Returns [`crate::AdmissionError::Configuration`] if `config` is invalid.
    pub fn new(store: Arc<dyn AdmissionStore>, config: AdmissionConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Gate with the default ten minute window
    #[must_use]
    pub fn with_defaults(store: Arc<dyn AdmissionStore>) -> Self {
        Self {
            store,
            config: AdmissionConfig::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Store key for `message`: the configured prefix and its fingerprint
    #[must_use]
    pub fn key(&self, message: &Message) -> String {
        format!("{}:{}", self.config.key_prefix, fingerprint(message))
    }

    /// Claim `message` for the admission window.
    ///
    /// Returns `true` if this call created the claim (the message is new) and
    /// `false` if a live claim already existed (the message is a duplicate).
    ///
    /// # Errors
    /// Propagates store failures, and reports a store that does not answer
    /// within the store timeout as unavailable; a failed claim says nothing about
    /// whether the message is new.
    pub async fn claim(&self, message: &Message) -> crate::Result<bool> {
        let key = self.key(message);
        let created = self
            .bounded(
                "claim",
                self.store
                    .set_if_absent(&key, CLAIM_VALUE, self.config.ttl()),
            )
            .await?;

        if created {
            internal!("Admitted message {}", key);
        } else {
            tracing::warn!(key = %key, "Duplicate message request detected");
        }

        Ok(created)
    }

    /// Drop any claim held for `message`, so it can be resubmitted immediately.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn release(&self, message: &Message) -> crate::Result<()> {
        let key = self.key(message);
        self.bounded("release", self.store.delete(&key)).await?;

        internal!("Released admission claim {}", key);
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = crate::Result<T>>,
    ) -> crate::Result<T> {
        let limit = self.config.store_timeout();
        tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(AdmissionError::Unavailable(format!(
                "admission store {operation} timed out after {}ms",
                limit.as_millis()
            )))
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{MemoryAdmissionStore, TestAdmissionStore};

    fn message() -> Message {
        Message::new(["a@example.com", "b@example.com"], "Subject", "Body")
    }

    #[test]
    fn test_key_has_prefix() {
        let gate = AdmissionGate::with_defaults(Arc::new(MemoryAdmissionStore::new()));
        let key = gate.key(&message());

        assert!(key.starts_with("idempotency:"));
        assert_eq!(key.len(), "idempotency:".len() + 64);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AdmissionConfig {
            ttl_secs: 0,
            ..AdmissionConfig::default()
        };
        let result = AdmissionGate::new(Arc::new(MemoryAdmissionStore::new()), config);
        assert!(matches!(result, Err(AdmissionError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_claim_then_duplicate() {
        let gate = AdmissionGate::with_defaults(Arc::new(MemoryAdmissionStore::new()));

        assert!(gate.claim(&message()).await.expect("claim"));
        assert!(!gate.claim(&message()).await.expect("claim"));
    }

    #[tokio::test]
    async fn test_reordered_recipients_are_duplicates() {
        let gate = AdmissionGate::with_defaults(Arc::new(MemoryAdmissionStore::new()));
        let reordered = Message::new(["b@example.com", "a@example.com"], "Subject", "Body");

        assert!(gate.claim(&message()).await.expect("claim"));
        assert!(!gate.claim(&reordered).await.expect("claim"));
    }

    #[tokio::test]
    async fn test_release_allows_reclaim() {
        let store = Arc::new(MemoryAdmissionStore::new());
        let gate = AdmissionGate::with_defaults(store.clone());

        assert!(gate.claim(&message()).await.expect("claim"));
        gate.release(&message()).await.expect("release");
        assert!(!store.contains(&gate.key(&message())));
        assert!(gate.claim(&message()).await.expect("claim"));
    }

    #[tokio::test]
    async fn test_release_without_claim() {
        let gate = AdmissionGate::with_defaults(Arc::new(MemoryAdmissionStore::new()));
        assert!(gate.release(&message()).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_fault_propagates() {
        let store = Arc::new(TestAdmissionStore::new());
        store.set_unavailable(true);
        let gate = AdmissionGate::with_defaults(store);

        let error = gate.claim(&message()).await.expect_err("claim should fail");
        assert!(error.is_unavailable());
        assert!(gate.release(&message()).await.is_err());
    }

    /// Never answers, like a store that accepted the connection and stalled
    struct StalledStore;

    #[async_trait::async_trait]
    impl AdmissionStore for StalledStore {
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> crate::Result<bool> {
            std::future::pending().await
        }

        async fn delete(&self, _: &str) -> crate::Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_reported_unavailable() {
        let config = AdmissionConfig {
            store_timeout_ms: 250,
            ..AdmissionConfig::default()
        };
        let gate = AdmissionGate::new(Arc::new(StalledStore), config).expect("config");

        let error = gate.claim(&message()).await.expect_err("claim should time out");
        assert!(error.is_unavailable());
        assert_eq!(
            error.to_string(),
            "Admission store unavailable: admission store claim timed out after 250ms"
        );

        let error = gate.release(&message()).await.expect_err("release should time out");
        assert!(error.is_unavailable());
    }
}
