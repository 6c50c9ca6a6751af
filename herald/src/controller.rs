use std::{path::Path, sync::Arc};

use anyhow::Context;
use herald_admission::{AdmissionConfig, AdmissionGate, AdmissionStore, MemoryAdmissionStore};
use herald_common::{Message, audit, internal, logging};
use herald_delivery::{
    DeliveryConfig, DeliveryOrchestrator, DeliveryResult, MockProvider, MockProviderConfig,
    Provider,
};
use serde::Deserialize;

/// Where admission claims are kept
#[derive(Debug, Clone, Default, Deserialize)]
pub enum StoreConfig {
    /// In-process store; duplicates are only suppressed within this process
    #[default]
    Memory,
    /// Shared Redis instance, e.g. `redis://127.0.0.1:6379`
    Redis { url: String },
}

/// Top-level configuration, deserialised from RON.
#[derive(Debug, Default, Deserialize)]
pub struct Herald {
    #[serde(default)]
    delivery: DeliveryConfig,
    #[serde(default)]
    admission: AdmissionConfig,
    #[serde(default)]
    store: StoreConfig,
    /// Providers in priority order; the reference pair is used when empty
    #[serde(alias = "provider", default)]
    providers: Vec<MockProviderConfig>,
    #[serde(default)]
    audit: audit::AuditConfig,
}

impl Herald {
    /// Load configuration from a RON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        ron::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    #[must_use]
    pub const fn delivery(&self) -> &DeliveryConfig {
        &self.delivery
    }

    #[must_use]
    pub const fn admission(&self) -> &AdmissionConfig {
        &self.admission
    }

    #[must_use]
    pub const fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Configured providers, or the reference pair when none are configured
    #[must_use]
    pub fn providers(&self) -> Vec<MockProviderConfig> {
        if self.providers.is_empty() {
            MockProviderConfig::default_pair()
        } else {
            self.providers.clone()
        }
    }

    /// Install logging and audit configuration
    pub fn init(&self) {
        logging::init();
        audit::init(self.audit.clone());
    }

    async fn admission_store(&self) -> anyhow::Result<Arc<dyn AdmissionStore>> {
        match &self.store {
            StoreConfig::Memory => Ok(Arc::new(MemoryAdmissionStore::new())),
            #[cfg(feature = "redis")]
            StoreConfig::Redis { url } => {
                let store = herald_admission::RedisAdmissionStore::connect(
                    url,
                    self.admission.store_timeout(),
                )
                .await
                .with_context(|| format!("Failed to connect to admission store at {url}"))?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis"))]
            StoreConfig::Redis { .. } => {
                anyhow::bail!("Redis admission store requested, but herald was built without the `redis` feature")
            }
        }
    }

    /// Build the orchestrator described by this configuration.
    ///
    /// # Errors
    /// Returns an error if the admission store cannot be reached or the
    /// configuration is invalid.
    pub async fn orchestrator(&self) -> anyhow::Result<DeliveryOrchestrator> {
        let store = self.admission_store().await?;
        let gate = AdmissionGate::new(store, self.admission.clone())?;

        let providers: Vec<Arc<dyn Provider>> = self
            .providers()
            .iter()
            .map(|config| Arc::new(MockProvider::from(config)) as Arc<dyn Provider>)
            .collect();

        let orchestrator = DeliveryOrchestrator::new(providers, gate, &self.delivery)?;

        internal!(
            "Delivery orchestrator ready with providers {:?}",
            orchestrator.provider_names().collect::<Vec<_>>()
        );

        Ok(orchestrator)
    }

    /// Build an orchestrator and deliver a single message through it.
    ///
    /// # Errors
    /// Returns an error if the orchestrator cannot be built or the admission
    /// store fails during delivery.
    pub async fn send(&self, message: &Message) -> anyhow::Result<DeliveryResult> {
        let orchestrator = self.orchestrator().await?;
        Ok(orchestrator.send_email(message).await?)
    }
}
