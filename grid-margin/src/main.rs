use anyhow::Result;
use grid_margin::{config::AppConfig, observability, report};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration (GRID_MARGIN_CONFIG, default grid-margin.toml)
    let cfg = AppConfig::load()?;

    report::run_report(&cfg).await?;

    Ok(())
}
