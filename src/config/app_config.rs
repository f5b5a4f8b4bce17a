use std::time::Duration;

use serde::Deserialize;

use crate::domain::context::ContextConfig;
use crate::domain::credentials::Credential;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub semantic_cache: SemanticCacheConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub vector_index: VectorIndexConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Relational store settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Reported in pool stats; the pool does not enforce it
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// OpenAI-compatible embedding endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Fallback key for CLI commands; services take the caller's credential
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default = "default_handle_ttl_minutes")]
    pub handle_ttl_minutes: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_url() -> String {
    "sqlite://rag_app.db".to_string()
}

fn default_max_connections() -> usize {
    10
}

fn default_embedding_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_handle_ttl_minutes() -> u64 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured key as a credential; empty when none is set
    pub fn credential(&self) -> Credential {
        Credential::new(self.api_key.clone().unwrap_or_default())
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            handle_ttl_minutes: default_handle_ttl_minutes(),
        }
    }
}

impl VectorIndexConfig {
    pub fn handle_ttl(&self) -> Duration {
        Duration::from_secs(self.handle_ttl_minutes.saturating_mul(60))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
