use tokio::net::TcpListener;

use bullseye_dashboard::config::AppConfig;
use bullseye_dashboard::logging::{init_logging, LoggingConfig};
use bullseye_dashboard::{app, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    let state = build_state(&config).await?;
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Bullseye dashboard running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
