//! Upstream dish catalog client.
//!
//! The provider is a single, rate-limited dependency shared by every
//! replica, consumed only through its query contract. [`DishSource`] is
//! that contract; [`DishCatalogClient`] implements it over HTTP with
//! bounded retries, and tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use platter_core::{DishQuery, DishRecord};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the dish provider.
///
/// Kept cloneable (string reasons, no source chains) so a single failure
/// can be broadcast to every caller waiting on the same flight.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The provider stayed unreachable or kept failing through all retries.
    #[error("dish provider unavailable after {attempts} attempts: {reason}")]
    Unavailable {
        /// Attempts made before giving up.
        attempts: u32,
        /// Last observed failure.
        reason: String,
    },

    /// The provider answered with a non-retryable client-side status.
    #[error("dish provider rejected the query with status {0}")]
    Rejected(u16),

    /// The provider answered but the payload was not decodable.
    #[error("dish provider response could not be decoded: {0}")]
    Decode(String),
}

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Total attempts, the initial call included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given zero-based attempt.
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// The dish provider's query contract.
///
/// An empty result set is a valid, cacheable answer ("no matching
/// dishes"), not an error.
#[async_trait]
pub trait DishSource: Send + Sync {
    /// Fetches the candidate dishes for a normalized query.
    async fn fetch(&self, query: &DishQuery) -> Result<Vec<DishRecord>, CatalogError>;

    /// Checks that the provider is reachable, for the health probe.
    async fn probe(&self) -> Result<(), CatalogError>;
}

/// HTTP client for the dish catalog provider.
///
/// Queries `GET {base_url}/dishes` with the tag constraints as request
/// parameters. Connection failures, timeouts and 5xx responses are retried
/// with exponential backoff per the configured [`RetryPolicy`]; a 404 is
/// the provider's way of saying "no matching dishes" and maps to an empty
/// result. Never touches the caches.
pub struct DishCatalogClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl DishCatalogClient {
    /// Creates a client for the provider at `base_url`.
    ///
    /// `request_timeout` bounds each individual attempt, not the whole
    /// retry schedule.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| CatalogError::Unavailable {
                attempts: 0,
                reason: err.to_string(),
            })?;
        Ok(DishCatalogClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            retry,
        })
    }

    fn query_params(query: &DishQuery) -> Vec<(&'static str, String)> {
        let join = |tags: &std::collections::BTreeSet<smol_str::SmolStr>| {
            tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(",")
        };
        let mut params = Vec::new();
        if !query.required_tags.is_empty() {
            params.push(("require", join(&query.required_tags)));
        }
        if !query.excluded_tags.is_empty() {
            params.push(("exclude", join(&query.excluded_tags)));
        }
        if !query.excluded_dishes.is_empty() {
            params.push(("exclude_dishes", join(&query.excluded_dishes)));
        }
        params
    }
}

#[async_trait]
impl DishSource for DishCatalogClient {
    async fn fetch(&self, query: &DishQuery) -> Result<Vec<DishRecord>, CatalogError> {
        let url = format!("{}/dishes", self.base_url);
        let params = Self::query_params(query);
        let mut last_reason = String::new();

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay(attempt - 1);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %last_reason,
                    "retrying dish catalog fetch"
                );
                tokio::time::sleep(delay).await;
            }

            match self.http.get(&url).query(&params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.as_u16() == 404 {
                        debug!("dish catalog reports no matching dishes");
                        return Ok(Vec::new());
                    }
                    if status.is_server_error() {
                        last_reason = format!("status {status}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(CatalogError::Rejected(status.as_u16()));
                    }
                    return response
                        .json::<Vec<DishRecord>>()
                        .await
                        .map_err(|err| CatalogError::Decode(err.to_string()));
                }
                Err(err) => {
                    last_reason = err.to_string();
                }
            }
        }

        Err(CatalogError::Unavailable {
            attempts: self.retry.max_attempts,
            reason: last_reason,
        })
    }

    async fn probe(&self) -> Result<(), CatalogError> {
        // Reachability only; any HTTP answer means the provider is up.
        let url = format!("{}/health", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| CatalogError::Unavailable {
                attempts: 1,
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay(0), Duration::from_millis(200));
        assert_eq!(retry.delay(1), Duration::from_millis(400));
        assert_eq!(retry.delay(2), Duration::from_millis(800));
        assert_eq!(retry.delay(10), Duration::from_secs(5));
    }
}
