use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::time::Instant;

use super::AdmissionStore;

#[derive(Debug, Clone, Copy)]
struct Claim {
    expires_at: Instant,
}

impl Claim {
    fn new(ttl: Duration) -> Self {
        Self {
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory admission store
///
/// Claims live in a `DashMap` and only their expiry is kept; the check-and-set runs under the entry's shard
/// lock, so it is atomic for every caller sharing this store. Expired claims
/// are treated as absent and replaced on the next claim for the same key.
/// Every `sweep_interval` claims the whole map is swept of expired entries,
/// so claims for messages that are never seen again do not accumulate.
///
/// Expiry follows the tokio clock, which tests can pause and advance.
///
/// Only callers inside this process share the store, so it suits tests and
/// single-instance deployments.
#[derive(Debug, Clone)]
pub struct MemoryAdmissionStore {
    claims: Arc<DashMap<String, Claim>>,
    claims_since_sweep: Arc<AtomicUsize>,
    sweep_interval: usize,
}

impl Default for MemoryAdmissionStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

/// Claims between two sweeps of expired entries
pub const DEFAULT_SWEEP_INTERVAL: usize = 1024;

impl MemoryAdmissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that sweeps expired claims after every `sweep_interval` claims (at least one)
    #[must_use]
    pub fn with_sweep_interval(sweep_interval: usize) -> Self {
        Self {
            claims: Arc::new(DashMap::new()),
            claims_since_sweep: Arc::new(AtomicUsize::new(0)),
            sweep_interval: sweep_interval.max(1),
        }
    }

    /// Number of stored claims, including any that have expired but not been purged
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Whether `key` holds a live claim
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.claims
            .get(key)
            .is_some_and(|claim| !claim.is_expired(now))
    }

    /// Drop every expired claim, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.claims.len();
        self.claims.retain(|_, claim| !claim.is_expired(now));
        before.saturating_sub(self.claims.len())
    }

    fn sweep_if_due(&self) {
        let claims = self.claims_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        if claims % self.sweep_interval == 0 {
            self.purge_expired();
        }
    }
}

#[async_trait]
impl AdmissionStore for MemoryAdmissionStore {
    async fn set_if_absent(&self, key: &str, _value: &str, ttl: Duration) -> crate::Result<bool> {
        // Sweep before taking the entry: retain locks every shard
        self.sweep_if_due();
        let now = Instant::now();

        match self.claims.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(Claim::new(ttl));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Claim::new(ttl));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> crate::Result<()> {
        self.claims.remove(key);
        Ok(())
    }
}
