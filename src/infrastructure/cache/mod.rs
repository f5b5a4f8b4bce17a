//! Cache infrastructure - Cache backends and the fail-open distributed client

mod distributed;
mod factory;
mod in_memory;
mod redis;

pub use distributed::{CacheStats, DistributedCache, DistributedCacheConfig};
pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
