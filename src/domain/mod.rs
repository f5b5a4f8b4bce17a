//! Domain layer - Core types, traits and pure logic

pub mod cache;
pub mod context;
pub mod conversation;
pub mod credentials;
pub mod embedding;
pub mod error;
pub mod pool;
pub mod semantic_cache;
pub mod vector_index;

pub use cache::{Cache, CacheExt, CacheKeys, CacheServerInfo, ContentHash};
pub use context::{estimate_tokens, ContextCompressor, ContextConfig};
pub use conversation::{ApplicationLog, DocumentRecord, Role, SessionId, Turn};
pub use credentials::{Credential, CredentialFingerprint};
pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use error::DomainError;
pub use pool::{
    ConnectionFactory, ConnectionPoolStats, HandleCacheStats, HandleFactory, ResourcePoolStats,
};
pub use semantic_cache::{
    SemanticCacheConfig, SemanticCacheRecord, SemanticCacheStats, SemanticMatch,
};
pub use vector_index::{IndexMatch, IndexedDocument, VectorIndex};
