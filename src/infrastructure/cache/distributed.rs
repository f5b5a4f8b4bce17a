//! Fail-open client over the shared key-value cache

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheKeys};
use crate::domain::conversation::{SessionId, Turn};
use crate::domain::credentials::Credential;
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_cache_lookup, CacheLookup};

/// Default TTLs for the namespaces owned by [`DistributedCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributedCacheConfig {
    pub chat_history_ttl: Duration,
    pub generation_config_ttl: Duration,
}

impl Default for DistributedCacheConfig {
    fn default() -> Self {
        Self {
            chat_history_ttl: Duration::from_secs(24 * 3600),
            generation_config_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Snapshot of the backend's health and keyspace counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub connected: bool,
    pub hits: u64,
    pub misses: u64,
    /// Percentage, rounded to two decimals
    pub hit_rate: f64,
    pub used_memory: Option<String>,
    pub connected_clients: u64,
    pub total_commands_processed: u64,
}

/// Shared cache client that never lets a backend failure escape
///
/// Unreachable backend means reads return a miss and writes return `false`.
/// Every operation probes liveness with a `PING` before the real command, so
/// each call costs two round trips. A cache built with [`DistributedCache::disabled`]
/// behaves like a permanently unreachable one, without the warnings.
#[derive(Debug, Clone)]
pub struct DistributedCache {
    backend: Option<Arc<dyn Cache>>,
    config: DistributedCacheConfig,
}

impl DistributedCache {
    pub fn new(backend: Arc<dyn Cache>, config: DistributedCacheConfig) -> Self {
        Self {
            backend: Some(backend),
            config,
        }
    }

    pub fn disabled(config: DistributedCacheConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn config(&self) -> &DistributedCacheConfig {
        &self.config
    }

    /// Returns the backend once it has answered a liveness probe
    async fn live_backend(&self) -> Result<&Arc<dyn Cache>, DomainError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| DomainError::cache("Distributed cache is disabled"))?;

        backend.ping().await?;
        Ok(backend)
    }

    fn degraded(&self, op: &str, key: &str, error: &DomainError) {
        if self.backend.is_some() {
            warn!(
                operation = op,
                key = %key,
                error = %error,
                "Cache unavailable, continuing without it"
            );
        }
    }

    async fn read(&self, cache: &'static str, key: &str) -> Option<String> {
        let result = match self.live_backend().await {
            Ok(backend) => backend.get_raw(key).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(value)) => {
                debug!(cache, key = %key, "Cache hit");
                record_cache_lookup(cache, CacheLookup::Hit);
                Some(value)
            }
            Ok(None) => {
                debug!(cache, key = %key, "Cache miss");
                record_cache_lookup(cache, CacheLookup::Miss);
                None
            }
            Err(e) => {
                record_cache_lookup(cache, CacheLookup::Unavailable);
                self.degraded("get", key, &e);
                None
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, cache: &'static str, key: &str) -> Option<T> {
        let raw = self.read(cache, key).await?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, &raw, ttl).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache value");
                false
            }
        }
    }

    /// Raw read, `None` on miss or when the backend is unreachable
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        self.read("raw", key).await
    }

    /// Raw write; a zero TTL is never stored
    pub async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> bool {
        if ttl.is_zero() {
            debug!(key = %key, "Skipping cache write with zero TTL");
            return false;
        }

        let result = match self.live_backend().await {
            Ok(backend) => backend.set_raw(key, value, ttl).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                self.degraded("set", key, &e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let result = match self.live_backend().await {
            Ok(backend) => backend.delete(key).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(deleted) => deleted,
            Err(e) => {
                self.degraded("delete", key, &e);
                false
            }
        }
    }

    /// Live keys matching a `*` glob; empty when the backend is unreachable
    pub async fn scan_keys(&self, pattern: &str) -> Vec<String> {
        let result = match self.live_backend().await {
            Ok(backend) => backend.scan_keys(pattern).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            self.degraded("scan", pattern, &e);
            Vec::new()
        })
    }

    pub async fn get_history(&self, session: &SessionId) -> Option<Vec<Turn>> {
        self.read_json("history", &CacheKeys::chat_history(session)).await
    }

    pub async fn set_history(&self, session: &SessionId, turns: &[Turn], ttl: Duration) -> bool {
        self.write_json(&CacheKeys::chat_history(session), turns, ttl).await
    }

    /// Appends one exchange to the cached history
    ///
    /// Read, extend and write are separate commands. Two concurrent appends
    /// to one session can lose one of the exchanges.
    pub async fn append_turn(
        &self,
        session: &SessionId,
        user_text: &str,
        assistant_text: &str,
    ) -> bool {
        let mut turns = self.get_history(session).await.unwrap_or_default();
        turns.push(Turn::user(user_text));
        turns.push(Turn::assistant(assistant_text));

        self.set_history(session, &turns, self.config.chat_history_ttl)
            .await
    }

    pub async fn invalidate_history(&self, session: &SessionId) -> bool {
        self.delete(&CacheKeys::chat_history(session)).await
    }

    /// Cached generation settings, keyed by the credential's fingerprint
    pub async fn get_generation_config<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        model: &str,
    ) -> Option<T> {
        let key = CacheKeys::generation_config(&credential.fingerprint(), model);
        self.read_json("generation_config", &key).await
    }

    /// Stores generation settings with the configured TTL
    pub async fn set_generation_config<T: Serialize>(
        &self,
        credential: &Credential,
        model: &str,
        config: &T,
    ) -> bool {
        self.set_generation_config_with_ttl(
            credential,
            model,
            config,
            self.config.generation_config_ttl,
        )
        .await
    }

    pub async fn set_generation_config_with_ttl<T: Serialize>(
        &self,
        credential: &Credential,
        model: &str,
        config: &T,
        ttl: Duration,
    ) -> bool {
        let key = CacheKeys::generation_config(&credential.fingerprint(), model);
        self.write_json(&key, config, ttl).await
    }

    pub async fn stats(&self) -> CacheStats {
        let info = match self.live_backend().await {
            Ok(backend) => backend.server_info().await,
            Err(e) => Err(e),
        };

        match info {
            Ok(info) => CacheStats {
                connected: true,
                hits: info.keyspace_hits,
                misses: info.keyspace_misses,
                hit_rate: hit_rate(info.keyspace_hits, info.keyspace_misses),
                used_memory: info.used_memory_human,
                connected_clients: info.connected_clients,
                total_commands_processed: info.total_commands_processed,
            },
            Err(e) => {
                self.degraded("info", "-", &e);
                CacheStats::default()
            }
        }
    }

    /// Empties the backend; used by explicit teardown
    pub async fn clear(&self) -> bool {
        let result = match self.live_backend().await {
            Ok(backend) => backend.clear().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                self.degraded("clear", "*", &e);
                false
            }
        }
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }

    let rate = hits as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::conversation::Role;

    fn cache_with(mock: Arc<MockCache>) -> DistributedCache {
        DistributedCache::new(mock, DistributedCacheConfig::default())
    }

    fn session() -> SessionId {
        SessionId::new("s1").unwrap()
    }

    #[tokio::test]
    async fn test_set_history_then_read_preserves_order() {
        let cache = cache_with(Arc::new(MockCache::new()));
        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];

        assert!(
            cache
                .set_history(&session(), &turns, Duration::from_secs(3600))
                .await
        );

        let history = cache.get_history(&session()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "hello");
    }

    #[tokio::test]
    async fn test_history_is_stored_as_role_content_list() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());

        cache
            .set_history(&session(), &[Turn::user("hi")], Duration::from_secs(60))
            .await;

        let raw = mock.get_raw("chat_history:s1").await.unwrap().unwrap();
        assert_eq!(raw, r#"[{"role":"user","content":"hi"}]"#);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_stored() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());

        let applied = cache
            .set_history(&session(), &[Turn::user("hi")], Duration::ZERO)
            .await;

        assert!(!applied);
        assert!(!mock.contains("chat_history:s1"));
        assert!(cache.get_history(&session()).await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let cache = cache_with(Arc::new(MockCache::new()));
        cache.append_turn(&session(), "q1", "a1").await;

        let first = cache.get_history(&session()).await;
        let second = cache.get_history(&session()).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_append_extends_in_order() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());

        assert!(cache.append_turn(&session(), "q1", "a1").await);
        assert!(cache.append_turn(&session(), "q2", "a2").await);

        let contents: Vec<String> = cache
            .get_history(&session())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.content)
            .collect();

        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
        assert_eq!(
            mock.stored_ttl("chat_history:s1"),
            Some(Duration::from_secs(24 * 3600))
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_open() {
        let mock = Arc::new(MockCache::new().with_error("connection refused"));
        let cache = cache_with(mock);

        assert!(cache.get_history(&session()).await.is_none());
        assert!(
            !cache
                .set_history(&session(), &[Turn::user("hi")], Duration::from_secs(60))
                .await
        );
        assert!(!cache.append_turn(&session(), "q", "a").await);
        assert!(!cache.invalidate_history(&session()).await);
        assert!(cache.scan_keys("semantic_cache:*").await.is_empty());
        assert!(!cache.stats().await.connected);
    }

    #[tokio::test]
    async fn test_recovers_when_backend_returns() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());

        mock.set_error(Some("down".to_string()));
        assert!(!cache.set_raw("k", "v", Duration::from_secs(60)).await);

        mock.set_error(None);
        assert!(cache.set_raw("k", "v", Duration::from_secs(60)).await);
        assert_eq!(cache.get_raw("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_every_operation_probes_liveness() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());

        cache.get_raw("k").await;
        cache.set_raw("k", "v", Duration::from_secs(60)).await;
        cache.delete("k").await;

        assert_eq!(mock.ping_count(), 3);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_a_permanent_miss() {
        let cache = DistributedCache::disabled(DistributedCacheConfig::default());

        assert!(!cache.is_enabled());
        assert!(cache.get_raw("k").await.is_none());
        assert!(!cache.set_raw("k", "v", Duration::from_secs(60)).await);
        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_generation_config_keyed_by_fingerprint() {
        let mock = Arc::new(MockCache::new());
        let cache = cache_with(mock.clone());
        let credential = Credential::new("sk-secret");
        let fingerprint = credential.fingerprint();
        let config = serde_json::json!({"temperature": 0.2, "top_k": 4});

        assert!(
            cache
                .set_generation_config(&credential, "gpt-4o", &config)
                .await
        );

        let key = format!("rag_chain:{}:gpt-4o", fingerprint);
        assert!(mock.contains(&key));
        assert_eq!(mock.stored_ttl(&key), Some(Duration::from_secs(30 * 60)));
        assert!(!key.contains("sk-secret"));

        let loaded: serde_json::Value = cache
            .get_generation_config(&credential, "gpt-4o")
            .await
            .unwrap();
        assert_eq!(loaded, config);

        let other: Option<serde_json::Value> =
            cache.get_generation_config(&credential, "gpt-4o-mini").await;
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_generation_config_ttl_override() {
        let mock = Arc::new(MockCache::new());
        let config = DistributedCacheConfig {
            generation_config_ttl: Duration::from_secs(120),
            ..Default::default()
        };
        let cache = DistributedCache::new(mock.clone(), config);
        let credential = Credential::new("sk-secret");
        let key = format!("rag_chain:{}:gpt-4o", credential.fingerprint());

        assert!(
            cache
                .set_generation_config(&credential, "gpt-4o", &serde_json::json!({"k": 1}))
                .await
        );
        assert_eq!(mock.stored_ttl(&key), Some(Duration::from_secs(120)));

        assert!(
            cache
                .set_generation_config_with_ttl(
                    &credential,
                    "gpt-4o",
                    &serde_json::json!({"k": 2}),
                    Duration::from_secs(5),
                )
                .await
        );
        assert_eq!(mock.stored_ttl(&key), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_invalidate_history() {
        let cache = cache_with(Arc::new(MockCache::new()));
        cache.append_turn(&session(), "q", "a").await;

        assert!(cache.invalidate_history(&session()).await);
        assert!(cache.get_history(&session()).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_history_is_a_miss() {
        let mock = Arc::new(MockCache::new().with_entry(
            "chat_history:s1",
            "not json",
            Duration::from_secs(60),
        ));
        let cache = cache_with(mock);

        assert!(cache.get_history(&session()).await.is_none());
    }

    #[tokio::test]
    async fn test_stats_hit_rate() {
        let cache = cache_with(Arc::new(MockCache::new()));
        cache.set_raw("k", "v", Duration::from_secs(60)).await;

        cache.get_raw("k").await;
        cache.get_raw("k").await;
        cache.get_raw("missing").await;

        let stats = cache.stats().await;
        assert!(stats.connected);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 66.67);
    }

    #[test]
    fn test_hit_rate_without_traffic() {
        assert_eq!(hit_rate(0, 0), 0.0);
        assert_eq!(hit_rate(3, 1), 75.0);
    }
}
