//! Generic TTL cache over a storage backend.
//!
//! Both service caches are instances of [`TtlCache`] with their own TTLs:
//! the dish cache additionally carries a stale grace window so expired dish
//! data stays reachable for degradation, the plan cache does not. Neither
//! TTL bounds the other.
//!
//! Freshness is decided here at read time from the envelope timestamps; the
//! TTL handed to the backend on writes is purely an eviction optimization.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use platter_backend::{Backend, BackendResult, CacheBackend, DeleteStatus};
use platter_core::{CacheState, CacheValue, Fingerprint};
use serde::{Serialize, de::DeserializeOwned};

/// Result of a cache lookup.
#[derive(Debug)]
pub enum Lookup<V> {
    /// An entry exists and is within a usable window.
    ///
    /// [`CacheState::Actual`] entries are served as fresh;
    /// [`CacheState::Stale`] entries are usable only under degradation.
    Hit(CacheValue<V>, CacheState),
    /// No entry, or the entry is past every usable window.
    Miss,
}

/// A typed TTL store over a shared [`Backend`].
///
/// Cloning is cheap; clones share the backend handle and configuration.
pub struct TtlCache<V> {
    backend: Arc<dyn Backend>,
    ttl: Duration,
    stale_window: Option<Duration>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        TtlCache {
            backend: Arc::clone(&self.backend),
            ttl: self.ttl,
            stale_window: self.stale_window,
            _value: PhantomData,
        }
    }
}

impl<V> TtlCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a cache writing entries with `ttl` and, optionally, a stale
    /// grace window past expiry.
    pub fn new(backend: Arc<dyn Backend>, ttl: Duration, stale_window: Option<Duration>) -> Self {
        TtlCache {
            backend,
            ttl,
            stale_window,
            _value: PhantomData,
        }
    }

    /// Looks up `key`. Never touches the upstream; a backend failure is a
    /// backend failure, the caller decides whether to treat it as a miss.
    pub async fn get(&self, key: &Fingerprint) -> BackendResult<Lookup<V>> {
        match self.backend.get::<V>(key).await? {
            Some(value) => match value.cache_state() {
                CacheState::Expired => Ok(Lookup::Miss),
                state => Ok(Lookup::Hit(value, state)),
            },
            None => Ok(Lookup::Miss),
        }
    }

    /// Stores `data` under `key`, stamping the configured windows.
    pub async fn put(&self, key: &Fingerprint, data: V) -> BackendResult<()> {
        let value = CacheValue::new(data, self.ttl, self.stale_window);
        self.backend.set(key, value).await
    }

    /// Drops the entry for `key`.
    pub async fn invalidate(&self, key: &Fingerprint) -> BackendResult<DeleteStatus> {
        self.backend.delete(key).await
    }
}
