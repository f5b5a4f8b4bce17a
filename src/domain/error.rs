use thiserror::Error;

/// Errors raised by the caching and pooling layer
///
/// Only `Storage` (connection creation, queries) and `Configuration` reach
/// callers of the fail-open components; cache and provider errors are turned
/// into misses at the boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input such as an empty session id
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Missing or rejected API key
    #[error("Credential error: {message}")]
    Credential { message: String },

    /// Embedding or other external service failure
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Relational store failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Cache backend unreachable, timed out or returned an error
    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error() {
        let error = DomainError::storage("database is locked");
        assert_eq!(error.to_string(), "Storage error: database is locked");
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("openai", "HTTP 401");
        assert_eq!(error.to_string(), "Provider error: openai - HTTP 401");
    }

    #[test]
    fn test_from_serde_error() {
        let parse: Result<Vec<f32>, _> = serde_json::from_str("not json");
        let error: DomainError = parse.unwrap_err().into();
        assert!(matches!(error, DomainError::Serialization { .. }));
    }
}
