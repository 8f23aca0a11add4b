//! simproxy binary: HTTP proxy for product similarity search.

use simproxy::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local development reads a .env; deployed environments set real vars.
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    simproxy::start_server(config).await?;

    Ok(())
}
