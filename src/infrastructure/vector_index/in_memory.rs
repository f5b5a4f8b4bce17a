//! In-memory vector index for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::credentials::Credential;
use crate::domain::embedding::{cosine_similarity, EmbeddingProvider};
use crate::domain::pool::HandleFactory;
use crate::domain::vector_index::{IndexMatch, IndexedDocument, VectorIndex};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct StoredDocument {
    document: IndexedDocument,
    embedding: Vec<f32>,
}

type Collection = Arc<RwLock<Vec<StoredDocument>>>;

/// Handle onto a shared in-memory collection, embedding with one credential
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    collection: Collection,
    provider: Arc<dyn EmbeddingProvider>,
    credential: Credential,
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, documents: Vec<IndexedDocument>) -> Result<usize, DomainError> {
        let mut embedded = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self.provider.embed(&document.text, &self.credential).await?;
            embedded.push(StoredDocument {
                document,
                embedding,
            });
        }

        let count = embedded.len();
        let mut collection = self.collection.write().await;

        for stored in embedded {
            collection.retain(|existing| existing.document.id != stored.document.id);
            collection.push(stored);
        }

        Ok(count)
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<IndexMatch>, DomainError> {
        let embedding = self.provider.embed(text, &self.credential).await?;
        let collection = self.collection.read().await;

        let mut matches: Vec<IndexMatch> = collection
            .iter()
            .map(|stored| IndexMatch {
                document: stored.document.clone(),
                score: cosine_similarity(&embedding, &stored.embedding),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);

        Ok(matches)
    }

    async fn delete_by_metadata(&self, key: &str, value: &str) -> Result<usize, DomainError> {
        let mut collection = self.collection.write().await;
        let before = collection.len();

        collection.retain(|stored| {
            stored.document.metadata.get(key).map(String::as_str) != Some(value)
        });

        Ok(before - collection.len())
    }
}

/// Creates [`InMemoryVectorIndex`] handles over one collection
///
/// Documents outlive individual handles, so recreating an expired handle
/// keeps the index contents.
#[derive(Debug)]
pub struct InMemoryVectorIndexFactory {
    collection: Collection,
    provider: Arc<dyn EmbeddingProvider>,
}

impl InMemoryVectorIndexFactory {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collection: Arc::new(RwLock::new(Vec::new())),
            provider,
        }
    }
}

#[async_trait]
impl HandleFactory for InMemoryVectorIndexFactory {
    type Handle = InMemoryVectorIndex;

    async fn create(&self, credential: &Credential) -> Result<InMemoryVectorIndex, DomainError> {
        if credential.is_empty() {
            return Err(DomainError::credential("Vector index requires an API key"));
        }

        Ok(InMemoryVectorIndex {
            collection: Arc::clone(&self.collection),
            provider: Arc::clone(&self.provider),
            credential: credential.clone(),
        })
    }
}
