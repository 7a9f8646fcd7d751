use anyhow::Context;
use axum::{Router, routing::get};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use beacon_server::{Config, RelayService, ws_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();

    let relay = RelayService::new();

    // Browser clients connect from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay);

    info!("Signaling relay listening on http://{}", config.listen);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
