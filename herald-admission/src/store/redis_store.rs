use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use super::AdmissionStore;

/// Redis-backed admission store
///
/// Claims are written with `SET key value NX EX ttl`, so Redis arbitrates
/// between every process sharing the instance. The connection manager
/// reconnects on its own after a dropped connection; calls made while it is
/// down, or that get no response within the configured timeout, fail with
/// [`crate::AdmissionError::Unavailable`].
#[derive(Clone)]
pub struct RedisAdmissionStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisAdmissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAdmissionStore").finish_non_exhaustive()
    }
}

impl RedisAdmissionStore {
    /// Connect to the Redis instance at `url` (e.g. `redis://127.0.0.1:6379`)
    ///
    /// `timeout` bounds the initial connection, every reconnect, and each
    /// response.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails
    /// or does not complete within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> crate::Result<Self> {
        let client = redis::Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout);

        let connection = tokio::time::timeout(
            timeout,
            ConnectionManager::new_with_config(client, config),
        )
        .await
        .map_err(|_| {
            crate::AdmissionError::Unavailable(format!(
                "connecting to {url} timed out after {}ms",
                timeout.as_millis()
            ))
        })??;

        Ok(Self { connection })
    }
}

#[async_trait]
impl AdmissionStore for RedisAdmissionStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> crate::Result<bool> {
        let mut connection = self.connection.clone();

        // EX only accepts whole seconds, and zero is rejected
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut connection)
            .await?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> crate::Result<()> {
        let mut connection = self.connection.clone();
        let _removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}
