//! airq web server
//!
//! Run with: cargo run -p airq-web

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airq_web::config::Config;
use airq_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = Config::path();
    let config = Config::load_from(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging.level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting airq dashboard...");
    if !config_path.exists() {
        warn!(
            path = %config_path.display(),
            "Config file not found, using defaults. Copy airq.example.toml to airq.toml to customise."
        );
    }

    let addr = config.bind_addr();
    let state = AppState::load(config)?;
    let app = airq_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
