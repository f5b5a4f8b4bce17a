//! Semantic cache domain models
//!
//! Matches new queries against previously answered ones by embedding
//! similarity rather than exact key matches.

mod config;
mod record;

pub use config::SemanticCacheConfig;
pub use record::{SemanticCacheRecord, SemanticCacheStats, SemanticMatch};
