//! Cached value envelope with expiration metadata.
//!
//! Every cache entry wraps its payload in a [`CacheValue`] carrying two
//! timestamps:
//!
//! - **expire** — end of the freshness window (creation + TTL)
//! - **stale** — end of the grace window during which expired data may
//!   still be served under degradation
//!
//! Freshness is evaluated at read time via [`CacheValue::cache_state`]; no
//! background sweep is required for correctness. Backends may additionally
//! evict on their own TTL as an optimization.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Freshness of a cached value relative to its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Within the freshness window.
    Actual,
    /// Past the freshness window but inside the stale grace window; usable
    /// only under degradation.
    Stale,
    /// Past every window; treated as a miss.
    Expired,
}

/// A cached payload with its expiration metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheValue<T> {
    data: T,
    created_at: DateTime<Utc>,
    expire: DateTime<Utc>,
    stale: Option<DateTime<Utc>>,
}

impl<T> CacheValue<T> {
    /// Wraps `data`, stamping the freshness window from `ttl` and the grace
    /// window from `stale_window` (measured past `expire`).
    pub fn new(data: T, ttl: Duration, stale_window: Option<Duration>) -> Self {
        let created_at = Utc::now();
        let expire = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let stale = stale_window.map(|w| {
            chrono::Duration::from_std(w)
                .ok()
                .and_then(|w| expire.checked_add_signed(w))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        CacheValue {
            data,
            created_at,
            expire,
            stale,
        }
    }

    /// Reference to the cached payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the envelope and returns the payload.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// When the entry was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Evaluates freshness against the current time.
    pub fn cache_state(&self) -> CacheState {
        let now = Utc::now();
        if now < self.expire {
            CacheState::Actual
        } else if self.stale.is_some_and(|stale| now < stale) {
            CacheState::Stale
        } else {
            CacheState::Expired
        }
    }

    /// Remaining time until the entry leaves its last usable window.
    ///
    /// Backends use this as their eviction TTL so entries survive long
    /// enough to serve the stale grace window.
    pub fn remaining_lifetime(&self) -> Option<Duration> {
        let end = self.stale.unwrap_or(self.expire);
        (end - Utc::now()).to_std().ok()
    }

    /// Maps the payload, preserving the timestamps.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheValue<U> {
        CacheValue {
            data: f(self.data),
            created_at: self.created_at,
            expire: self.expire,
            stale: self.stale,
        }
    }

    /// Fallibly maps the payload, preserving the timestamps.
    ///
    /// Used by the typed backend layer to decode stored bytes without losing
    /// the original expiration metadata.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<CacheValue<U>, E> {
        Ok(CacheValue {
            data: f(self.data)?,
            created_at: self.created_at,
            expire: self.expire,
            stale: self.stale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_actual() {
        let value = CacheValue::new("plan", Duration::from_secs(60), None);
        assert_eq!(value.cache_state(), CacheState::Actual);
    }

    #[test]
    fn expired_entry_without_grace_window_is_expired() {
        let value = CacheValue::new("plan", Duration::ZERO, None);
        assert_eq!(value.cache_state(), CacheState::Expired);
    }

    #[test]
    fn expired_entry_within_grace_window_is_stale() {
        let value = CacheValue::new("dishes", Duration::ZERO, Some(Duration::from_secs(60)));
        assert_eq!(value.cache_state(), CacheState::Stale);
    }

    #[test]
    fn remaining_lifetime_covers_grace_window() {
        let value = CacheValue::new((), Duration::from_secs(10), Some(Duration::from_secs(50)));
        let remaining = value.remaining_lifetime().unwrap();
        assert!(remaining > Duration::from_secs(55));
        assert!(remaining <= Duration::from_secs(60));
    }

    #[test]
    fn map_preserves_timestamps() {
        let value = CacheValue::new(2u32, Duration::from_secs(60), None);
        let created = value.created_at();
        let mapped = value.map(|n| n * 2);
        assert_eq!(*mapped.data(), 4);
        assert_eq!(mapped.created_at(), created);
    }
}
