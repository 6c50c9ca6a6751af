//! Backing stores for admission claims
//!
//! - `memory`: in-process store with per-entry expiry
//! - `test`: memory store with call counters and fault injection
//! - `redis_store`: networked store for deployments with more than one process

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

pub use self::memory::MemoryAdmissionStore;
#[cfg(feature = "redis")]
pub use self::redis_store::RedisAdmissionStore;
pub use self::test::TestAdmissionStore;

/// Key-value store holding admission claims.
///
/// Implementations must make [`set_if_absent`](Self::set_if_absent) atomic
/// across every caller that can reach the store, including callers in other
/// processes when the store is shared.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, but only if `key` is absent or expired.
    ///
    /// Returns `true` if this call created the record.
    ///
    /// # Errors
    /// Returns [`crate::AdmissionError::Unavailable`] if the store cannot be reached.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> crate::Result<bool>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns [`crate::AdmissionError::Unavailable`] if the store cannot be reached.
    async fn delete(&self, key: &str) -> crate::Result<()>;
}
