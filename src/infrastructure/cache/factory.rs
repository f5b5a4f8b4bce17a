//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::distributed::{DistributedCache, DistributedCacheConfig};
use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory cache using moka, local to the process
    InMemory,
    /// Redis cache, shared between workers and processes
    #[default]
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, redis",
                s
            ))),
        }
    }
}

/// `cache` configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub cache_type: CacheType,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default)]
    pub key_prefix: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Entry limit of the in-memory backend
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_chat_history_ttl_hours")]
    pub chat_history_ttl_hours: u64,
    #[serde(default = "default_rag_chain_ttl_minutes")]
    pub rag_chain_ttl_minutes: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_chat_history_ttl_hours() -> u64 {
    24
}

fn default_rag_chain_ttl_minutes() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cache_type: CacheType::default(),
            redis_url: default_redis_url(),
            key_prefix: None,
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
            max_capacity: default_max_capacity(),
            chat_history_ttl_hours: default_chat_history_ttl_hours(),
            rag_chain_ttl_minutes: default_rag_chain_ttl_minutes(),
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration for in-memory cache
    pub fn in_memory() -> Self {
        Self {
            cache_type: CacheType::InMemory,
            ..Default::default()
        }
    }

    /// Creates a new configuration for Redis cache
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            cache_type: CacheType::Redis,
            redis_url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn distributed_config(&self) -> DistributedCacheConfig {
        let chat_history_secs = self.chat_history_ttl_hours.saturating_mul(3600);
        let generation_config_secs = self.rag_chain_ttl_minutes.saturating_mul(60);

        DistributedCacheConfig {
            chat_history_ttl: Duration::from_secs(chat_history_secs),
            generation_config_ttl: Duration::from_secs(generation_config_secs),
        }
    }

    fn redis_config(&self) -> RedisCacheConfig {
        let config = RedisCacheConfig::new(self.redis_url.clone())
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs));

        match &self.key_prefix {
            Some(prefix) => config.with_key_prefix(prefix.clone()),
            None => config,
        }
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache backend based on configuration
    ///
    /// The Redis backend connects lazily, so this only fails on an invalid URL.
    pub fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        match config.cache_type {
            CacheType::InMemory => {
                let in_memory_config =
                    InMemoryCacheConfig::default().with_max_capacity(config.max_capacity);

                Ok(Arc::new(InMemoryCache::with_config(in_memory_config)))
            }
            CacheType::Redis => Ok(Arc::new(RedisCache::new(config.redis_config())?)),
        }
    }

    /// Creates the fail-open client; a backend that cannot be built leaves
    /// the cache disabled rather than failing startup
    pub fn create_distributed(&self, config: &CacheConfig) -> DistributedCache {
        let distributed_config = config.distributed_config();

        if !config.enabled {
            info!("Distributed cache disabled by configuration");
            return DistributedCache::disabled(distributed_config);
        }

        match self.create(config) {
            Ok(backend) => {
                info!(cache_type = %config.cache_type, "Distributed cache configured");
                DistributedCache::new(backend, distributed_config)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to create cache backend, running without distributed cache"
                );
                DistributedCache::disabled(distributed_config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("in_memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("memory".parse::<CacheType>().unwrap(), CacheType::InMemory);
        assert_eq!("REDIS".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert!("memcached".parse::<CacheType>().is_err());
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.cache_type, CacheType::Redis);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.read_timeout_secs, 5);

        let ttls = config.distributed_config();
        assert_eq!(ttls.chat_history_ttl, Duration::from_secs(86_400));
        assert_eq!(ttls.generation_config_ttl, Duration::from_secs(1_800));
    }

    #[test]
    fn test_cache_config_deserializes_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"cache_type": "in_memory", "chat_history_ttl_hours": 1}"#)
                .unwrap();

        assert_eq!(config.cache_type, CacheType::InMemory);
        assert_eq!(config.chat_history_ttl_hours, 1);
        assert_eq!(config.rag_chain_ttl_minutes, 30);
        assert_eq!(config.redis_url, "redis://localhost:6379");
    }

    #[test]
    fn test_huge_ttl_settings_saturate() {
        let mut config = CacheConfig::default();
        config.chat_history_ttl_hours = u64::MAX;
        config.rag_chain_ttl_minutes = u64::MAX;

        let ttls = config.distributed_config();
        assert_eq!(ttls.chat_history_ttl, Duration::from_secs(u64::MAX));
        assert_eq!(ttls.generation_config_ttl, Duration::from_secs(u64::MAX));
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let factory = CacheFactory::new();
        let cache = factory.create(&CacheConfig::in_memory()).unwrap();

        cache
            .set("test", &"value", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("test").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }

    #[test]
    fn test_factory_rejects_invalid_redis_url() {
        let factory = CacheFactory::new();
        assert!(factory.create(&CacheConfig::redis("not a url")).is_err());
    }

    #[tokio::test]
    async fn test_create_distributed_falls_back_to_disabled() {
        let factory = CacheFactory::new();

        let cache = factory.create_distributed(&CacheConfig::redis("not a url"));
        assert!(!cache.is_enabled());

        let cache = factory.create_distributed(&CacheConfig::in_memory().with_enabled(false));
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn test_create_distributed_unreachable_redis_fails_open() {
        let mut config = CacheConfig::redis("redis://127.0.0.1:1");
        config.connect_timeout_secs = 1;

        let cache = CacheFactory::new().create_distributed(&config);

        assert!(cache.is_enabled());
        assert!(cache.get_raw("anything").await.is_none());
        assert!(!cache.set_raw("anything", "v", Duration::from_secs(60)).await);
    }

    #[test]
    fn test_cache_type_display() {
        assert_eq!(CacheType::InMemory.to_string(), "in_memory");
        assert_eq!(CacheType::Redis.to_string(), "redis");
    }
}
