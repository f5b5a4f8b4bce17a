use clap::Parser;
use rag_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate => cli::migrate::run().await,
        Command::Stats => cli::stats::run().await,
        Command::History(args) => cli::history::run(args).await,
        Command::InvalidateHistory(args) => cli::history::invalidate(args).await,
    }
}
