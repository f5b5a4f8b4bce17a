//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, EmbeddingConfig, LogFormat, LoggingConfig, VectorIndexConfig,
};
