use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

mod api;
mod config;
mod db;
mod media;
mod transcribe;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(config::DaemonConfig::from_env()?);

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Arc::new(db::Database::new(&config.db_path)?);
    info!("Transcript cache initialized at {:?}", config.db_path);

    match &config.ml_service_url {
        Some(url) => info!("Transcribing narration via {}", url),
        None => info!("ML_SERVICE_URL not set, captions will use uniform timing"),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api::router(db, config.clone()))
        .layer(cors);

    info!("Starting caption daemon on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
