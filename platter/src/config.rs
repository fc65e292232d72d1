//! Environment configuration.
//!
//! Built once at startup via [`AppConfig::from_env`] and passed down
//! explicitly — components never read the environment themselves, so tests
//! construct configs (and fakes) directly.

use std::env::VarError;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::RetryPolicy;

/// A configuration value that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {name}: {reason}")]
pub struct ConfigError {
    /// Environment variable name.
    pub name: &'static str,
    /// The rejected raw value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Dish catalog provider settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL the provider is queried at.
    pub base_url: String,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

/// Cache store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store host.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// Logical database index.
    pub db: u32,
}

impl StoreConfig {
    /// Connection URL for the redis backend.
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Cache freshness windows.
///
/// The two TTLs are deliberately decoupled: dish data ages on the
/// provider's schedule, plans on the request traffic's. Neither bounds the
/// other.
#[derive(Debug, Clone)]
pub struct CachePolicyConfig {
    /// Dish cache entry freshness window.
    pub menu_cache_ttl: Duration,
    /// Plan cache entry freshness window.
    pub plan_cache_ttl: Duration,
    /// How far past expiry dish data may still back a degraded plan.
    pub dish_stale_ceiling: Duration,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dish provider settings.
    pub catalog: CatalogConfig,
    /// Cache store settings.
    pub store: StoreConfig,
    /// Cache freshness windows.
    pub cache: CachePolicyConfig,
}

impl AppConfig {
    /// Reads the configuration from the environment, with the deployment
    /// manifest's variable names and defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AppConfig {
            catalog: CatalogConfig {
                base_url: env_or("DISH_API_URL", "http://127.0.0.1:8001")?,
                request_timeout: Duration::from_secs(parse_env(
                    "APP_UPSTREAM_TIMEOUT_SECONDS",
                    10,
                )?),
                retry: RetryPolicy::default(),
            },
            store: StoreConfig {
                host: env_or("REDIS_HOST", "localhost")?,
                port: parse_env("APP_REDIS_PORT", 6379)?,
                db: parse_env("APP_REDIS_DB", 0)?,
            },
            cache: CachePolicyConfig {
                menu_cache_ttl: Duration::from_secs(parse_env(
                    "APP_REDIS_MENU_CACHE_TTL_SECONDS",
                    3600,
                )?),
                plan_cache_ttl: Duration::from_secs(parse_env(
                    "APP_REDIS_PLAN_CACHE_TTL_SECONDS",
                    600,
                )?),
                dish_stale_ceiling: Duration::from_secs(parse_env(
                    "APP_DISH_STALE_CEILING_SECONDS",
                    86_400,
                )?),
            },
        })
    }
}

fn env_or(name: &'static str, default: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => Ok(raw),
        Err(VarError::NotPresent) => Ok(default.to_owned()),
        Err(VarError::NotUnicode(raw)) => Err(not_unicode(name, &raw)),
    }
}

fn parse_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|err: T::Err| ConfigError {
            name,
            value: raw,
            reason: err.to_string(),
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(raw)) => Err(not_unicode(name, &raw)),
    }
}

// A set-but-undecodable variable is an operator mistake, not an absence.
fn not_unicode(name: &'static str, raw: &std::ffi::OsStr) -> ConfigError {
    ConfigError {
        name,
        value: raw.to_string_lossy().into_owned(),
        reason: "not valid unicode".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_builds_connection_url() {
        let store = StoreConfig {
            host: "cache.internal".to_owned(),
            port: 6380,
            db: 2,
        };
        assert_eq!(store.connection_url(), "redis://cache.internal:6380/2");
    }

    #[test]
    fn parse_env_reports_the_offending_variable() {
        // Variable unset: default wins.
        assert_eq!(parse_env("PLATTER_TEST_UNSET", 7u32).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_values_are_rejected_not_defaulted() {
        use std::os::unix::ffi::OsStringExt;

        let name = "PLATTER_TEST_NOT_UNICODE";
        let raw = std::ffi::OsString::from_vec(vec![b'x', 0xff]);
        unsafe { std::env::set_var(name, &raw) };

        let err = parse_env(name, 7u32).unwrap_err();
        assert_eq!(err.name, name);
        assert_eq!(err.reason, "not valid unicode");
        assert!(env_or(name, "fallback").is_err());

        unsafe { std::env::remove_var(name) };
    }
}
