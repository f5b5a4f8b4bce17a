//! Vector index trait

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A document chunk stored in a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl IndexedDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A query hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexMatch {
    pub document: IndexedDocument,
    pub score: f32,
}

/// External vector index, reached through a per-credential handle
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Inserts or replaces documents by id
    async fn upsert(&self, documents: Vec<IndexedDocument>) -> Result<usize, DomainError>;

    /// Returns the `limit` documents closest to `text`
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<IndexMatch>, DomainError>;

    /// Deletes every document whose metadata has `key == value`
    async fn delete_by_metadata(&self, key: &str, value: &str) -> Result<usize, DomainError>;
}
