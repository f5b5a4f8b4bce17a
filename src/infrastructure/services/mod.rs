//! Infrastructure services

mod caching_services;

pub use caching_services::{CachingServices, ConversationContext, ServiceStats, VectorIndexPool};
