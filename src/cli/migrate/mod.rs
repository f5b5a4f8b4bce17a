//! Migrate command - creates the conversation tables

use tracing::info;

/// Run pending schema migrations
pub async fn run() -> anyhow::Result<()> {
    let (config, services) = super::bootstrap()?;

    let applied = services.conversations().ensure_schema().await?;
    info!(database = %config.database.url, applied, "Migrations complete");

    println!("Applied {} migration(s) to {}", applied, config.database.url);
    Ok(())
}
