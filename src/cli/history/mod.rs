//! History commands - read or invalidate a session's chat history

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::domain::conversation::SessionId;

/// Arguments for session-scoped commands
#[derive(Args, Clone)]
pub struct SessionArgs {
    /// Session identifier
    #[arg(long)]
    pub session: String,
}

/// Print the session's history, filling the cache on a miss
pub async fn run(args: SessionArgs) -> anyhow::Result<()> {
    let (_, services) = super::bootstrap()?;
    let session = SessionId::new(args.session)?;

    let history = services
        .conversations()
        .get_chat_history(&session)
        .await
        .context("Failed to read chat history; has `rag-cache migrate` been run?")?;

    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

/// Remove the session's cached history; the stored rows are untouched
pub async fn invalidate(args: SessionArgs) -> anyhow::Result<()> {
    let (_, services) = super::bootstrap()?;
    let session = SessionId::new(args.session)?;

    let removed = services.cache().invalidate_history(&session).await;
    info!(session = %session.as_str(), removed, "Chat history invalidated");

    println!(
        "{}",
        if removed {
            "Cached history removed"
        } else {
            "No cached history found"
        }
    );
    Ok(())
}
