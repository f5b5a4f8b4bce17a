//! Process-wide container wiring the caching and pooling components

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::context::ContextCompressor;
use crate::domain::conversation::{SessionId, Turn};
use crate::domain::credentials::Credential;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::pool::ResourcePoolStats;
use crate::domain::semantic_cache::SemanticCacheStats;
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheFactory, CacheStats, DistributedCache};
use crate::infrastructure::embedding::{HttpClient, OpenAiEmbeddingProvider};
use crate::infrastructure::pool::{ResourcePool, SqliteConnectionFactory};
use crate::infrastructure::semantic_cache::SemanticMatcher;
use crate::infrastructure::storage::ConversationStore;
use crate::infrastructure::vector_index::{InMemoryVectorIndex, InMemoryVectorIndexFactory};

pub type VectorIndexPool = ResourcePool<SqliteConnectionFactory, InMemoryVectorIndexFactory>;

/// Combined snapshot of every layer
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub pool: ResourcePoolStats,
    pub cache: CacheStats,
    pub semantic_cache: SemanticCacheStats,
}

/// Trimmed history plus a summary of the turns that were dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub turns: Vec<Turn>,
    pub summary: String,
}

/// Holds the shared cache client, resource pool, semantic matcher,
/// compressor and conversation store
///
/// Cloning is cheap; every clone shares the same pools and caches.
#[derive(Debug, Clone)]
pub struct CachingServices {
    cache: DistributedCache,
    pool: Arc<VectorIndexPool>,
    matcher: Arc<SemanticMatcher>,
    compressor: ContextCompressor,
    conversations: ConversationStore,
}

impl CachingServices {
    /// Builds every component from configuration
    ///
    /// An unreachable or misconfigured cache does not fail construction; the
    /// services run without it.
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let cache = CacheFactory::new().create_distributed(&config.cache);

        let client = HttpClient::with_timeout(config.embedding.request_timeout())?;
        let provider =
            OpenAiEmbeddingProvider::with_base_url(client, config.embedding.base_url.clone())
                .with_model(config.embedding.model.clone());

        Self::with_components(config, cache, Arc::new(provider))
    }

    /// Builds the services around an existing cache client and provider
    pub fn with_components(
        config: &AppConfig,
        cache: DistributedCache,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, DomainError> {
        let pool = Arc::new(ResourcePool::new(
            SqliteConnectionFactory::new(config.database.url.clone())?,
            config.database.max_connections,
            InMemoryVectorIndexFactory::new(Arc::clone(&provider)),
            config.vector_index.handle_ttl(),
        ));

        let matcher = SemanticMatcher::new(cache.clone(), provider, config.semantic_cache.clone())
            .with_context_config(config.context.clone());

        let conversations = ConversationStore::new(pool.connections().clone(), cache.clone());

        info!(
            database = %config.database.url,
            cache_enabled = cache.is_enabled(),
            similarity_threshold = config.semantic_cache.similarity_threshold,
            "Caching services created"
        );

        Ok(Self {
            cache,
            pool,
            matcher: Arc::new(matcher),
            compressor: ContextCompressor::new(config.context.clone()),
            conversations,
        })
    }

    pub fn cache(&self) -> &DistributedCache {
        &self.cache
    }

    pub fn pool(&self) -> &VectorIndexPool {
        &self.pool
    }

    pub fn matcher(&self) -> &SemanticMatcher {
        &self.matcher
    }

    pub fn compressor(&self) -> &ContextCompressor {
        &self.compressor
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Vector index handle for the caller's credential
    pub async fn vector_index(&self, credential: &Credential) -> Option<Arc<InMemoryVectorIndex>> {
        self.pool.acquire_handle(credential).await
    }

    /// Session history fitted to the configured token budget
    pub async fn conversation_context(
        &self,
        session: &SessionId,
    ) -> Result<ConversationContext, DomainError> {
        let history = self.conversations.get_chat_history(session).await?;
        let (turns, summary) = self.compressor.optimize(&history, self.compressor.budget());

        Ok(ConversationContext { turns, summary })
    }

    pub async fn stats(&self) -> ServiceStats {
        ServiceStats {
            pool: self.pool.stats().await,
            cache: self.cache.stats().await,
            semantic_cache: self.matcher.stats().await,
        }
    }

    /// Drops cached handles, local embeddings and idle connections
    ///
    /// Distributed cache entries are left alone; other processes may still
    /// be using them.
    pub async fn clear(&self) {
        self.pool.clear_handles().await;
        self.matcher.clear_local().await;
        let closed = self.pool.connections().close_idle();

        info!(closed_connections = closed, "Caching services cleared");
    }
}
