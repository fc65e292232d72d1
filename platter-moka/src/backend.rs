//! Moka backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use platter_backend::{Backend, BackendResult, DeleteStatus};
use platter_core::{CacheValue, Fingerprint};

/// In-memory cache backend powered by Moka.
///
/// Provides a concurrent, capacity-bounded in-process cache with lock-free
/// reads. Entries are evicted least-recently-used once `max_capacity` is
/// reached; time-based expiry is left to read-time evaluation of the
/// envelope, so the `ttl` hint on writes is ignored.
///
/// Data is neither persisted nor shared across processes — use
/// `platter-redis` when replicas must share a cache.
#[derive(Clone, Debug)]
pub struct MokaBackend {
    cache: Cache<Fingerprint, CacheValue<Bytes>>,
    name: String,
}

impl MokaBackend {
    /// Creates a builder with the given maximum entry count.
    pub fn builder(max_capacity: u64) -> MokaBackendBuilder {
        MokaBackendBuilder {
            max_capacity,
            name: "moka".to_owned(),
        }
    }

    /// Access to the underlying Moka cache, mainly for tests that need to
    /// flush pending eviction work.
    pub fn cache(&self) -> &Cache<Fingerprint, CacheValue<Bytes>> {
        &self.cache
    }
}

/// Builder for [`MokaBackend`].
#[derive(Debug)]
pub struct MokaBackendBuilder {
    max_capacity: u64,
    name: String,
}

impl MokaBackendBuilder {
    /// Overrides the backend name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the backend.
    pub fn build(self) -> MokaBackend {
        MokaBackend {
            cache: Cache::new(self.max_capacity),
            name: self.name,
        }
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<CacheValue<Bytes>>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(
        &self,
        key: &Fingerprint,
        value: CacheValue<Bytes>,
        _ttl: Option<Duration>,
    ) -> BackendResult<()> {
        self.cache.insert(*key, value).await;
        Ok(())
    }

    async fn remove(&self, key: &Fingerprint) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
