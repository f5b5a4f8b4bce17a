use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::credentials::CredentialFingerprint;

/// A previously answered query, stored under `semantic_cache:{hash}`
///
/// Records are write-once. A newer answer for the same normalized query
/// overwrites the key; near-duplicates under other keys coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCacheRecord {
    pub query: String,
    pub response: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub context_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub credential_hash: CredentialFingerprint,
}

/// Best match returned by a similarity lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub response: String,
    pub similarity: f32,
    pub original_query: String,
    pub timestamp: DateTime<Utc>,
}

impl From<(SemanticCacheRecord, f32)> for SemanticMatch {
    fn from((record, similarity): (SemanticCacheRecord, f32)) -> Self {
        Self {
            response: record.response,
            similarity,
            original_query: record.query,
            timestamp: record.timestamp,
        }
    }
}

/// Read-only snapshot of the semantic cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemanticCacheStats {
    /// Records currently under the semantic-cache namespace
    pub entries: usize,
    /// Embeddings held in the in-process map
    pub local_embeddings: u64,
    pub similarity_threshold: f32,
    pub max_history_length: usize,
    pub max_context_tokens: usize,
    pub summary_tokens: usize,
}
