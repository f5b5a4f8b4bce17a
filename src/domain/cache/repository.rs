//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::DomainError;

/// Server-side counters reported by a cache backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheServerInfo {
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,
    pub used_memory_human: Option<String>,
    pub connected_clients: u64,
    pub total_commands_processed: u64,
}

/// Key-value cache backend with per-entry TTL
///
/// Implementations surface every failure as a `DomainError`; the fail-open
/// policy lives one layer up, in `DistributedCache`.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Liveness probe
    async fn ping(&self) -> Result<(), DomainError>;

    /// Gets a raw value from the cache
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value in the cache with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Lists live keys matching a glob pattern (`*` wildcard only)
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError>;

    /// Server statistics
    async fn server_info(&self) -> Result<CacheServerInfo, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheExt: Cache {
    /// Gets a typed JSON value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed JSON value in the cache with a TTL
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

/// Compiles a `*`-glob into an anchored regex
pub(crate) fn glob_regex(pattern: &str) -> Result<Regex, DomainError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{}$", body))
        .map_err(|e| DomainError::cache(format!("Invalid pattern '{}': {}", pattern, e)))
}
