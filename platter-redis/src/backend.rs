//! Redis backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use platter_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use platter_core::{CacheValue, Fingerprint};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis cache backend based on the redis-rs crate.
///
/// Uses a lazily-initialized [`ConnectionManager`] for asynchronous network
/// interaction; the manager reconnects on its own after transient failures.
/// Entries are stored as JSON strings under the fingerprint's string form,
/// with the write-time TTL hint mapped to redis `EX` so the store drops
/// entries once their last usable window has passed.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    name: String,
}

impl RedisBackend {
    /// Creates a builder with default settings (`redis://127.0.0.1/`).
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Lazily creates the shared [`ConnectionManager`].
    async fn connection(&self) -> Result<ConnectionManager, BackendError> {
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("initialize redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager.clone())
    }
}

/// Builder for [`RedisBackend`].
pub struct RedisBackendBuilder {
    connection_info: String,
    name: String,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            name: "redis".to_owned(),
        }
    }
}

impl RedisBackendBuilder {
    /// Sets the connection info (host, port, database).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Overrides the backend name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the backend. Fails only on malformed connection info; the
    /// actual connection is established lazily on first use.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_info.as_str())?,
            connection: OnceCell::new(),
            name: self.name,
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<CacheValue<Bytes>>> {
        let mut conn = self.connection().await?;
        let stored: Option<String> = conn
            .get(key.to_string())
            .await
            .map_err(Error::from)
            .map_err(BackendError::from)?;
        stored
            .map(|payload| serde_json::from_str(&payload).map_err(BackendError::from))
            .transpose()
    }

    async fn write(
        &self,
        key: &Fingerprint,
        value: CacheValue<Bytes>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(&value)?;
        let key = key.to_string();
        match ttl {
            Some(ttl) if !ttl.is_zero() => conn
                .set_ex::<_, _, ()>(key, payload, ttl.as_secs().max(1))
                .await
                .map_err(Error::from)
                .map_err(BackendError::from),
            _ => conn
                .set::<_, _, ()>(key, payload)
                .await
                .map_err(Error::from)
                .map_err(BackendError::from),
        }
    }

    async fn remove(&self, key: &Fingerprint) -> BackendResult<DeleteStatus> {
        let mut conn = self.connection().await?;
        let deleted: u32 = conn
            .del(key.to_string())
            .await
            .map_err(Error::from)
            .map_err(BackendError::from)?;
        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    async fn ping(&self) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(Error::from)
            .map_err(BackendError::from)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_malformed_connection_info() {
        assert!(RedisBackend::builder().server("not a url").build().is_err());
    }

    #[test]
    fn entry_payload_roundtrips_through_json() {
        let value = CacheValue::new(
            Bytes::from_static(b"{\"days\":[]}"),
            Duration::from_secs(30),
            Some(Duration::from_secs(300)),
        );
        let encoded = serde_json::to_string(&value).unwrap();
        let decoded: CacheValue<Bytes> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }
}
