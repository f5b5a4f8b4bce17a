//! Context compression - keeps conversation history within a token budget

mod compressor;
mod config;

pub use compressor::{estimate_tokens, ContextCompressor};
pub use config::ContextConfig;
