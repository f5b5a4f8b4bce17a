//! CLI module for the RAG cache
//!
//! Provides maintenance subcommands over the caching services:
//! - `migrate`: create the relational schema
//! - `stats`: print pool, cache and semantic-cache stats
//! - `history`: print a session's chat history
//! - `invalidate-history`: drop a session's cached history

pub mod history;
pub mod migrate;
pub mod stats;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::services::CachingServices;

/// RAG cache - caching and pooling layer for conversational retrieval
#[derive(Parser)]
#[command(name = "rag-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create missing tables in the relational store
    Migrate,

    /// Print pool, cache and semantic-cache stats as JSON
    Stats,

    /// Print a session's chat history
    History(history::SessionArgs),

    /// Drop a session's cached chat history
    InvalidateHistory(history::SessionArgs),
}

/// Loads configuration, starts logging and builds the services
pub(crate) fn bootstrap() -> anyhow::Result<(AppConfig, CachingServices)> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let services = CachingServices::from_config(&config)?;
    Ok((config, services))
}
