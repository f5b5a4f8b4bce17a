//! Embedding-similarity lookup over previously answered queries

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache as MokaCache;
use tracing::{debug, info, warn};

use crate::domain::cache::{CacheKeys, ContentHash};
use crate::domain::context::ContextConfig;
use crate::domain::credentials::Credential;
use crate::domain::embedding::{cosine_similarity, decode_vector, encode_vector, EmbeddingProvider};
use crate::domain::semantic_cache::{
    SemanticCacheConfig, SemanticCacheRecord, SemanticCacheStats, SemanticMatch,
};
use crate::infrastructure::cache::DistributedCache;
use crate::infrastructure::observability::{
    record_cache_lookup, record_embedding_source, CacheLookup, EmbeddingSource,
};

/// Semantic response cache
///
/// Embeddings are resolved through two tiers: an in-process map, then the
/// distributed cache, then the provider. Lookups scan every record under
/// `semantic_cache:*`, so cost grows linearly with the number of cached
/// answers.
pub struct SemanticMatcher {
    cache: DistributedCache,
    provider: Arc<dyn EmbeddingProvider>,
    local: MokaCache<ContentHash, Vec<f32>>,
    config: SemanticCacheConfig,
    context: ContextConfig,
}

impl fmt::Debug for SemanticMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticMatcher")
            .field("provider", &self.provider.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl SemanticMatcher {
    pub fn new(
        cache: DistributedCache,
        provider: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        let local = MokaCache::builder()
            .max_capacity(config.local_capacity)
            .build();

        Self {
            cache,
            provider,
            local,
            config,
            context: ContextConfig::default(),
        }
    }

    /// Context settings echoed in [`SemanticMatcher::stats`]
    pub fn with_context_config(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Returns the embedding for `text`, or `None` when the provider fails
    ///
    /// Two concurrent first resolutions of the same text may both reach the
    /// provider; the second write wins and both values are equivalent.
    pub async fn resolve_embedding(&self, text: &str, credential: &Credential) -> Option<Vec<f32>> {
        let hash = ContentHash::of(text);

        if let Some(vector) = self.local.get(&hash).await {
            debug!(hash = %hash.short(), "Embedding found in local map");
            record_embedding_source(EmbeddingSource::Local);
            return Some(vector);
        }

        let key = CacheKeys::embedding(&hash);
        if let Some(encoded) = self.cache.get_raw(&key).await {
            match decode_vector(&encoded) {
                Ok(vector) => {
                    debug!(hash = %hash.short(), "Embedding found in distributed cache");
                    record_embedding_source(EmbeddingSource::Distributed);
                    self.local.insert(hash, vector.clone()).await;
                    return Some(vector);
                }
                Err(e) => warn!(key = %key, error = %e, "Ignoring undecodable cached embedding"),
            }
        }

        match self.provider.embed(text, credential).await {
            Ok(vector) => {
                record_embedding_source(EmbeddingSource::Provider);
                self.local.insert(hash, vector.clone()).await;
                self.cache
                    .set_raw(&key, &encode_vector(&vector), self.config.embedding_ttl())
                    .await;
                Some(vector)
            }
            Err(e) => {
                record_embedding_source(EmbeddingSource::Failed);
                warn!(
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Embedding failed, treating as cache miss"
                );
                None
            }
        }
    }

    /// Best cached answer whose similarity strictly exceeds the configured threshold
    pub async fn find_similar(
        &self,
        query: &str,
        credential: &Credential,
    ) -> Option<SemanticMatch> {
        self.find_similar_with_threshold(query, credential, self.config.similarity_threshold)
            .await
    }

    /// Like [`SemanticMatcher::find_similar`] with an explicit threshold
    ///
    /// On equal similarity the record scanned first is kept.
    pub async fn find_similar_with_threshold(
        &self,
        query: &str,
        credential: &Credential,
        threshold: f32,
    ) -> Option<SemanticMatch> {
        let embedding = self.resolve_embedding(query, credential).await?;
        let keys = self
            .cache
            .scan_keys(&CacheKeys::semantic_cache_pattern())
            .await;

        let mut best: Option<(SemanticCacheRecord, f32)> = None;

        for key in &keys {
            // May have expired since the scan
            let Some(raw) = self.cache.get_raw(key).await else {
                continue;
            };

            let record: SemanticCacheRecord = match serde_json::from_str(&raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable semantic cache record");
                    continue;
                }
            };

            let similarity = cosine_similarity(&embedding, &record.embedding);

            if similarity > threshold && best.as_ref().is_none_or(|(_, top)| similarity > *top) {
                best = Some((record, similarity));
            }
        }

        match best {
            Some((record, similarity)) => {
                info!(
                    similarity,
                    scanned = keys.len(),
                    original_query = %record.query,
                    "Semantic cache hit"
                );
                record_cache_lookup("semantic", CacheLookup::Hit);
                Some(SemanticMatch::from((record, similarity)))
            }
            None => {
                debug!(scanned = keys.len(), threshold, "Semantic cache miss");
                record_cache_lookup("semantic", CacheLookup::Miss);
                None
            }
        }
    }

    /// Stores a query/response pair with the configured TTL
    pub async fn cache_response(
        &self,
        query: &str,
        response: &str,
        credential: &Credential,
        context_hash: Option<&str>,
    ) -> bool {
        self.cache_response_with_ttl(
            query,
            response,
            credential,
            context_hash,
            self.config.response_ttl(),
        )
        .await
    }

    /// Stores a query/response pair; `false` if the embedding or the write failed
    pub async fn cache_response_with_ttl(
        &self,
        query: &str,
        response: &str,
        credential: &Credential,
        context_hash: Option<&str>,
        ttl: Duration,
    ) -> bool {
        let Some(embedding) = self.resolve_embedding(query, credential).await else {
            return false;
        };

        let hash = ContentHash::of(query);
        let record = SemanticCacheRecord {
            query: query.to_string(),
            response: response.to_string(),
            embedding,
            context_hash: context_hash.map(str::to_string),
            timestamp: Utc::now(),
            credential_hash: credential.fingerprint(),
        };

        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize semantic cache record");
                return false;
            }
        };

        let stored = self
            .cache
            .set_raw(&CacheKeys::semantic_cache(&hash), &raw, ttl)
            .await;

        if stored {
            debug!(hash = %hash.short(), "Cached response");
        }

        stored
    }

    pub async fn stats(&self) -> SemanticCacheStats {
        let entries = self
            .cache
            .scan_keys(&CacheKeys::semantic_cache_pattern())
            .await
            .len();
        self.local.run_pending_tasks().await;

        SemanticCacheStats {
            entries,
            local_embeddings: self.local.entry_count(),
            similarity_threshold: self.config.similarity_threshold,
            max_history_length: self.config.max_history_length,
            max_context_tokens: self.context.max_context_tokens,
            summary_tokens: self.context.summary_tokens,
        }
    }

    /// Empties the in-process embedding map
    pub async fn clear_local(&self) {
        self.local.invalidate_all();
        self.local.run_pending_tasks().await;
    }
}
