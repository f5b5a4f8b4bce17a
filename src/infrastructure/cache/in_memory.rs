//! In-memory cache implementation using moka

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{glob_regex, Cache, CacheServerInfo};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Process-local stand-in for the Redis backend
///
/// Expiry is checked per entry on read, so an expired entry is inert until
/// the next access purges it. Keyspace hit/miss counters mirror what Redis
/// reports in `INFO`.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    commands: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            commands: AtomicU64::new(0),
        }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() >= entry.expires_at
    }

    fn count_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the live entry for `key`, purging it if expired
    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await?;

        if Self::is_expired(&entry) {
            self.cache.remove(key).await;
            return None;
        }

        Some(entry)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn ping(&self) -> Result<(), DomainError> {
        self.count_command();
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.count_command();

        match self.live_entry(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.data))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.count_command();

        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Self::current_time_millis().saturating_add(ttl_millis),
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        self.count_command();
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, DomainError> {
        self.count_command();
        let regex = glob_regex(pattern)?;

        self.cache.run_pending_tasks().await;

        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(k, entry)| !Self::is_expired(entry) && regex.is_match(k.as_str()))
            .map(|(k, _)| k.as_ref().clone())
            .collect();
        keys.sort();

        Ok(keys)
    }

    async fn server_info(&self) -> Result<CacheServerInfo, DomainError> {
        self.count_command();
        self.cache.run_pending_tasks().await;

        Ok(CacheServerInfo {
            keyspace_hits: self.hits.load(Ordering::Relaxed),
            keyspace_misses: self.misses.load(Ordering::Relaxed),
            used_memory_human: None,
            connected_clients: 1,
            total_commands_processed: self.commands.load(Ordering::Relaxed),
        })
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.count_command();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_millis(50))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_huge_ttl_keeps_entry() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("key1", "forever", Duration::from_secs(u64::MAX / 1000))
            .await
            .unwrap();
        cache.set_raw("key2", "max", Duration::MAX).await.unwrap();

        assert_eq!(cache.get_raw("key1").await.unwrap().as_deref(), Some("forever"));
        assert_eq!(cache.get_raw("key2").await.unwrap().as_deref(), Some("max"));
    }

    #[tokio::test]
    async fn test_rewrite_after_expiry() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("key1", "old", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get_raw("key1").await.unwrap().is_none());

        cache
            .set_raw("key1", "new", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get_raw("key1").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_scan_keys_skips_expired_and_other_namespaces() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("semantic_cache:a", "1", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set_raw("semantic_cache:b", "2", Duration::from_millis(10))
            .await
            .unwrap();
        cache
            .set_raw("embedding:a", "3", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let keys = cache.scan_keys("semantic_cache:*").await.unwrap();
        assert_eq!(keys, vec!["semantic_cache:a".to_string()]);
    }

    #[tokio::test]
    async fn test_server_info_counts_hits_and_misses() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("key1", "v", Duration::from_secs(60))
            .await
            .unwrap();
        cache.get_raw("key1").await.unwrap();
        cache.get_raw("key1").await.unwrap();
        cache.get_raw("missing").await.unwrap();

        let info = cache.server_info().await.unwrap();

        assert_eq!(info.keyspace_hits, 2);
        assert_eq!(info.keyspace_misses, 1);
        assert!(info.total_commands_processed >= 4);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();

        cache
            .set_raw("key1", "v", Duration::from_secs(60))
            .await
            .unwrap();
        cache.clear().await.unwrap();

        assert!(cache.scan_keys("*").await.unwrap().is_empty());
    }
}
