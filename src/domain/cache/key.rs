//! Cache key namespaces and hashing

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::conversation::SessionId;
use crate::domain::credentials::CredentialFingerprint;

const CHAT_HISTORY_NAMESPACE: &str = "chat_history";
const GENERATION_CONFIG_NAMESPACE: &str = "rag_chain";
const SEMANTIC_CACHE_NAMESPACE: &str = "semantic_cache";
const EMBEDDING_NAMESPACE: &str = "embedding";

const CONTENT_HASH_LEN: usize = 32;

/// Fixed-length hash of normalized query text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes the text after trimming and collapsing internal whitespace
    pub fn of(text: &str) -> Self {
        let normalized = Self::normalize(text);
        let digest = Sha256::digest(normalized.as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(CONTENT_HASH_LEN);
        Self(hex)
    }

    pub fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builders for every key namespace this crate writes
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKeys;

impl CacheKeys {
    pub fn chat_history(session: &SessionId) -> String {
        format!("{}:{}", CHAT_HISTORY_NAMESPACE, session.as_str())
    }

    pub fn generation_config(fingerprint: &CredentialFingerprint, model: &str) -> String {
        format!(
            "{}:{}:{}",
            GENERATION_CONFIG_NAMESPACE,
            fingerprint.as_str(),
            model
        )
    }

    pub fn semantic_cache(hash: &ContentHash) -> String {
        format!("{}:{}", SEMANTIC_CACHE_NAMESPACE, hash.as_str())
    }

    pub fn semantic_cache_pattern() -> String {
        format!("{}:*", SEMANTIC_CACHE_NAMESPACE)
    }

    pub fn embedding(hash: &ContentHash) -> String {
        format!("{}:{}", EMBEDDING_NAMESPACE, hash.as_str())
    }
}
