//! RAG Cache
//!
//! Caching and resource pooling for a conversational retrieval service:
//! - Per-worker relational connections and per-credential external handles
//! - A fail-open distributed cache for chat history and generation settings
//! - Embedding-similarity reuse of previous answers
//! - Token-budgeted compression of chat history

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use infrastructure::services::CachingServices;
