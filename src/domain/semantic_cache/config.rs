//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for semantic caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Similarity a cached query must strictly exceed to count as a hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Reported in stats; history length the orchestrator keeps per prompt
    #[serde(default = "default_max_history_length")]
    pub max_history_length: usize,

    /// Capacity of the in-process embedding map
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u64,

    /// Lifetime of query/response records
    #[serde(default = "default_response_ttl_hours")]
    pub response_ttl_hours: u64,

    /// Lifetime of embeddings in the distributed tier
    #[serde(default = "default_embedding_ttl_hours")]
    pub embedding_ttl_hours: u64,
}

fn default_similarity_threshold() -> f32 {
    0.85
}

fn default_max_history_length() -> usize {
    20
}

fn default_local_capacity() -> u64 {
    10_000
}

fn default_response_ttl_hours() -> u64 {
    6
}

fn default_embedding_ttl_hours() -> u64 {
    24
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_history_length: default_max_history_length(),
            local_capacity: default_local_capacity(),
            response_ttl_hours: default_response_ttl_hours(),
            embedding_ttl_hours: default_embedding_ttl_hours(),
        }
    }
}

impl SemanticCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_hours.saturating_mul(3600))
    }

    pub fn embedding_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_ttl_hours.saturating_mul(3600))
    }

    /// Set the similarity threshold, clamped to `[0.0, 1.0]`
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_local_capacity(mut self, capacity: u64) -> Self {
        self.local_capacity = capacity;
        self
    }

    pub fn with_response_ttl_hours(mut self, hours: u64) -> Self {
        self.response_ttl_hours = hours;
        self
    }
}
