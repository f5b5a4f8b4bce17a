//! Counters emitted by the caching layer
//!
//! No recorder is installed here; the embedding application decides whether
//! and where these are exported. Without a recorder every call is a no-op.

use metrics::counter;

/// Outcome of a cache read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    /// Backend unreachable, treated as a miss
    Unavailable,
}

impl CacheLookup {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Connection pool lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEvent {
    Created,
    Reused,
    Released,
    Failed,
}

impl PoolEvent {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Reused => "reused",
            Self::Released => "released",
            Self::Failed => "failed",
        }
    }
}

/// Tier that satisfied an embedding lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    Local,
    Distributed,
    Provider,
    Failed,
}

impl EmbeddingSource {
    fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Distributed => "distributed",
            Self::Provider => "provider",
            Self::Failed => "failed",
        }
    }
}

/// Record a cache lookup against one of the named caches
/// (`history`, `generation_config`, `semantic`, `embedding`)
pub fn record_cache_lookup(cache: &'static str, result: CacheLookup) {
    let labels = [("cache", cache.to_string()), ("result", result.as_str().to_string())];
    counter!("cache_lookups_total", &labels).increment(1);
}

pub fn record_pool_event(event: PoolEvent) {
    counter!("pool_connections_total", "event" => event.as_str()).increment(1);
}

pub fn record_embedding_source(source: EmbeddingSource) {
    counter!("embedding_requests_total", "source" => source.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_values() {
        assert_eq!(CacheLookup::Unavailable.as_str(), "unavailable");
        assert_eq!(PoolEvent::Reused.as_str(), "reused");
        assert_eq!(EmbeddingSource::Distributed.as_str(), "distributed");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cache_lookup("history", CacheLookup::Hit);
        record_pool_event(PoolEvent::Created);
        record_embedding_source(EmbeddingSource::Provider);
    }
}
