//! Vector index boundary - the external document index consumed through handles

mod provider;

pub use provider::{IndexMatch, IndexedDocument, VectorIndex};
