//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    record_cache_lookup, record_embedding_source, record_pool_event, CacheLookup, EmbeddingSource,
    PoolEvent,
};
