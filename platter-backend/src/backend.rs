use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use platter_core::{CacheValue, Fingerprint};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{BackendResult, DeleteStatus};

/// Raw storage operations over opaque byte payloads.
///
/// `ttl` on [`write`](Backend::write) is an eviction hint: stores that
/// support native expiry (redis) should honor it, in-process stores may.
/// Correctness never depends on it — freshness is evaluated at read time
/// from the envelope's own timestamps.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reads the entry for `key`, if present.
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<CacheValue<Bytes>>>;

    /// Writes the entry for `key`, replacing any previous one atomically.
    async fn write(
        &self,
        key: &Fingerprint,
        value: CacheValue<Bytes>,
        ttl: Option<Duration>,
    ) -> BackendResult<()>;

    /// Removes the entry for `key`.
    async fn remove(&self, key: &Fingerprint) -> BackendResult<DeleteStatus>;

    /// Checks that the backing store is reachable.
    ///
    /// Feeds the service health probe. In-process stores are always
    /// reachable, which is the default.
    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }

    /// Name of this backend, used in logs.
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<CacheValue<Bytes>>> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: &Fingerprint,
        value: CacheValue<Bytes>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &Fingerprint) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn ping(&self) -> BackendResult<()> {
        (**self).ping().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend> {
    async fn read(&self, key: &Fingerprint) -> BackendResult<Option<CacheValue<Bytes>>> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: &Fingerprint,
        value: CacheValue<Bytes>,
        ttl: Option<Duration>,
    ) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn remove(&self, key: &Fingerprint) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn ping(&self) -> BackendResult<()> {
        (**self).ping().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Typed cache operations layered over a raw [`Backend`].
///
/// Payloads are encoded with serde_json; the envelope timestamps pass
/// through untouched so read-time freshness evaluation sees the original
/// creation time, not the decode time.
pub trait CacheBackend: Backend {
    /// Reads and decodes the entry for `key`.
    fn get<T>(
        &self,
        key: &Fingerprint,
    ) -> impl Future<Output = BackendResult<Option<CacheValue<T>>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            match self.read(key).await? {
                Some(raw) => {
                    let value = raw.try_map(|bytes| serde_json::from_slice::<T>(&bytes))?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Encodes and writes `value` under `key`.
    ///
    /// The store-level eviction TTL is the envelope's remaining lifetime,
    /// so entries survive exactly long enough to serve any stale window.
    fn set<T>(
        &self,
        key: &Fingerprint,
        value: CacheValue<T>,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        T: Serialize + Send + Sync,
    {
        async move {
            let ttl = value.remaining_lifetime();
            let raw = value.try_map(|data| serde_json::to_vec(&data).map(Bytes::from))?;
            self.write(key, raw, ttl).await
        }
    }

    /// Removes the entry for `key`.
    fn delete(
        &self,
        key: &Fingerprint,
    ) -> impl Future<Output = BackendResult<DeleteStatus>> + Send {
        async move { self.remove(key).await }
    }
}

impl<B: Backend + ?Sized> CacheBackend for B {}
