//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::credentials::Credential;
use crate::domain::DomainError;

/// External text-to-vector service
///
/// The credential is passed per call: one provider instance serves every
/// caller, each with their own key.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embeds a single text into a fixed-length vector
    async fn embed(&self, text: &str, credential: &Credential) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Embedding provider returning scripted vectors
    ///
    /// Texts without a scripted vector get a deterministic vector derived from
    /// their bytes.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        dimensions: usize,
        scripted: HashMap<String, Vec<f32>>,
        error: Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                scripted: HashMap::new(),
                error: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.scripted.insert(text.into(), vector);
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            self.set_error(Some(error.into()));
            self
        }

        pub fn set_error(&self, error: Option<String>) {
            *self.error.lock().unwrap() = error;
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(
            &self,
            text: &str,
            credential: &Credential,
        ) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::provider("mock", error));
            }

            if credential.is_empty() {
                return Err(DomainError::credential("Missing API key"));
            }

            if let Some(vector) = self.scripted.get(text) {
                return Ok(vector.clone());
            }

            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            Ok((0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0) - 0.5)
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_scripted_vector() {
            let provider = MockEmbeddingProvider::new(2).with_vector("hello", vec![1.0, 0.0]);

            let vector = provider.embed("hello", &Credential::new("k")).await.unwrap();

            assert_eq!(vector, vec![1.0, 0.0]);
            assert_eq!(provider.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_provider_deterministic_fallback() {
            let provider = MockEmbeddingProvider::new(16);
            let credential = Credential::new("k");

            let a = provider.embed("same", &credential).await.unwrap();
            let b = provider.embed("same", &credential).await.unwrap();

            assert_eq!(a.len(), 16);
            assert_eq!(a, b);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new(4).with_error("rate limited");

            let result = provider.embed("hello", &Credential::new("k")).await;

            assert!(result.is_err());
        }
    }
}
