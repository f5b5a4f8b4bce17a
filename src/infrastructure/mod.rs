//! Infrastructure layer - Backends, pools and the service container

pub mod cache;
pub mod embedding;
pub mod logging;
pub mod observability;
pub mod pool;
pub mod semantic_cache;
pub mod services;
pub mod storage;
pub mod vector_index;
