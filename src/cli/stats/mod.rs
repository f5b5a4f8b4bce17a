//! Stats command - prints a snapshot of every caching layer

/// Print combined stats as pretty JSON
pub async fn run() -> anyhow::Result<()> {
    let (_, services) = super::bootstrap()?;

    let stats = services.stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
