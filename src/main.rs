use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use devhub_api::cli::Cli;
use devhub_api::database::DatabaseManager;
use devhub_api::{app, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devhub_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.apply(config::config().clone());
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting DevHub API in {:?} mode", config.environment);

    let store = DatabaseManager::connect(&config.database)
        .await
        .context("failed to initialize entity store")?;

    let bind_addr = format!("{}:{}", cli.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("DevHub API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
