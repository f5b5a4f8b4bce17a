//! Redis cache implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::OnceCell;

use crate::domain::cache::{Cache, CacheServerInfo};
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Per-command response timeout
    pub read_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-command timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// The connection is opened on first use and retried on every call until it
/// succeeds, so a server that is down at startup is picked up once it comes
/// back. Every command is bounded by `read_timeout`; a timeout surfaces as a
/// `DomainError::Cache` like any other transport failure.
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisCache {
    /// Creates a client without touching the network; only the URL is validated
    pub fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            config,
        })
    }

    /// Creates a client and opens the connection immediately
    pub async fn connect(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let cache = Self::new(config)?;
        cache.connection().await?;
        Ok(cache)
    }

    async fn connection(&self) -> Result<ConnectionManager, DomainError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let manager = tokio::time::timeout(
                    self.config.connect_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| {
                    DomainError::cache(format!(
                        "Timed out connecting to Redis after {:?}",
                        self.config.connect_timeout
                    ))
                })?
                .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

                tracing::info!(url = %self.config.url, "Connected to Redis");
                Ok::<_, DomainError>(manager)
            })
            .await?;

        Ok(connection.clone())
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn strip_prefix(&self, key: String) -> String {
        match &self.config.key_prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .map(str::to_string)
                .unwrap_or(key),
            None => key,
        }
    }

    /// Runs one command under the read timeout
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.config.read_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DomainError::cache(format!("Redis {} failed: {}", op, e))),
            Err(_) => Err(DomainError::cache(format!(
                "Redis {} timed out after {:?}",
                op, self.config.read_timeout
            ))),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection().await?;
        let _: String = self
            .bounded("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        self.bounded("GET", conn.get(&prefixed_key)).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        self.bounded("PSETEX", conn.pset_ex(&prefixed_key, value, ttl_millis(ttl)))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection().await?;

        let deleted: i64 = self.bounded("DEL", conn.del(&prefixed_key)).await?;
        Ok(deleted > 0)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        let prefixed_pattern = self.prefix_key(pattern);
        let mut conn = self.connection().await?;

        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = self
                .bounded(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&prefixed_pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut conn),
                )
                .await?;

            found.extend(keys.into_iter().map(|k| self.strip_prefix(k)));
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once
        found.sort();
        found.dedup();

        Ok(found)
    }

    async fn server_info(&self) -> Result<CacheServerInfo, DomainError> {
        let mut conn = self.connection().await?;
        let raw: String = self
            .bounded("INFO", redis::cmd("INFO").query_async(&mut conn))
            .await?;

        Ok(parse_info(&raw))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        match &self.config.key_prefix {
            Some(_) => {
                let keys = self.scan_keys("*").await?;
                for key in keys {
                    self.delete(&key).await?;
                }
            }
            None => {
                let mut conn = self.connection().await?;
                let _: () = self
                    .bounded("FLUSHDB", redis::cmd("FLUSHDB").query_async(&mut conn))
                    .await?;
            }
        }

        Ok(())
    }
}

/// Extracts the counters we report from an `INFO` reply
/// Redis rejects expiries whose absolute time overflows a signed 64-bit value
const MAX_TTL_MILLIS: u64 = (i64::MAX / 2) as u64;

/// `PSETEX` expiry: whole milliseconds, at least one
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis())
        .unwrap_or(MAX_TTL_MILLIS)
        .clamp(1, MAX_TTL_MILLIS)
}

fn parse_info(raw: &str) -> CacheServerInfo {
    let mut info = CacheServerInfo::default();

    for line in raw.lines() {
        let Some((field, value)) = line.trim().split_once(':') else {
            continue;
        };

        match field {
            "keyspace_hits" => info.keyspace_hits = value.parse().unwrap_or(0),
            "keyspace_misses" => info.keyspace_misses = value.parse().unwrap_or(0),
            "used_memory_human" => info.used_memory_human = Some(value.to_string()),
            "connected_clients" => info.connected_clients = value.parse().unwrap_or(0),
            "total_commands_processed" => {
                info.total_commands_processed = value.parse().unwrap_or(0)
            }
            _ => {}
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::connect(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_sub_second_ttl_expires() {
        let cache = RedisCache::connect(get_test_config()).await.unwrap();

        cache
            .set_raw("short", "v", Duration::from_millis(300))
            .await
            .unwrap();
        assert!(cache.get_raw("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(cache.get_raw("short").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete() {
        let cache = RedisCache::connect(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_scan_strips_prefix() {
        let cache = RedisCache::connect(get_test_config()).await.unwrap();

        cache
            .set_raw("semantic_cache:scan1", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let keys = cache.scan_keys("semantic_cache:*").await.unwrap();
        assert!(keys.contains(&"semantic_cache:scan1".to_string()));

        cache.delete("semantic_cache:scan1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ping_and_info() {
        let cache = RedisCache::connect(get_test_config()).await.unwrap();

        cache.ping().await.unwrap();
        let info = cache.server_info().await.unwrap();
        assert!(info.connected_clients >= 1);
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let config = RedisCacheConfig::new("redis://127.0.0.1:1")
            .with_connect_timeout(Duration::from_millis(500));

        assert!(RedisCache::connect(config).await.is_err());
    }

    #[tokio::test]
    async fn test_lazy_client_reports_unreachable_server() {
        let config = RedisCacheConfig::new("redis://127.0.0.1:1")
            .with_connect_timeout(Duration::from_millis(500));
        let cache = RedisCache::new(config).unwrap();

        assert!(cache.ping().await.is_err());
        assert!(cache.get_raw("key").await.is_err());
    }

    #[test]
    fn test_invalid_url_fails() {
        assert!(RedisCache::new(RedisCacheConfig::new("not a url")).is_err());
    }

    #[test]
    fn test_parse_info() {
        let raw = "# Stats\r\n\
                   total_commands_processed:1200\r\n\
                   keyspace_hits:90\r\n\
                   keyspace_misses:10\r\n\
                   # Clients\r\n\
                   connected_clients:3\r\n\
                   # Memory\r\n\
                   used_memory_human:1.02M\r\n";

        let info = parse_info(raw);

        assert_eq!(info.keyspace_hits, 90);
        assert_eq!(info.keyspace_misses, 10);
        assert_eq!(info.connected_clients, 3);
        assert_eq!(info.total_commands_processed, 1200);
        assert_eq!(info.used_memory_human.as_deref(), Some("1.02M"));
    }

    #[test]
    fn test_ttl_millis_keeps_precision() {
        assert_eq!(ttl_millis(Duration::from_millis(1900)), 1900);
        assert_eq!(ttl_millis(Duration::from_millis(500)), 500);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::MAX), MAX_TTL_MILLIS);
    }

    #[test]
    fn test_parse_info_missing_fields() {
        let info = parse_info("# Server\r\nredis_version:7.2.0\r\n");
        assert_eq!(info, CacheServerInfo::default());
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisCacheConfig::new("redis://localhost").with_key_prefix("myapp");
        assert_eq!(config.key_prefix, Some("myapp".to_string()));
    }
}
