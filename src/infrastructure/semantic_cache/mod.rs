//! Semantic cache infrastructure

mod matcher;

pub use matcher::SemanticMatcher;
