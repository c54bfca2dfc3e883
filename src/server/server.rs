use anyhow::Result;
use chrono::{DateTime, Utc};
use std::future::IntoFuture;
use std::time::Duration;
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use super::analysis_routes::analysis_routes;
use super::chat_routes::chat_routes;
use super::metrics::metrics_handler;
use super::session_routes::session_routes;
use super::{log_requests, state::*, ServerConfig};

const SERVICE_NAME: &str = "MAITRI AI Assistant";

#[derive(Serialize)]
struct ServerStats {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        status: "online",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

pub fn make_app(
    config: ServerConfig,
    analyzer: GuardedAnalyzer,
    chatbot: GuardedChatbot,
    persistence: GuardedPersistence,
) -> Router {
    let state = ServerState::new(config.clone(), analyzer, chatbot, persistence);

    Router::new()
        .route("/", get(home))
        .merge(analysis_routes(config.max_upload_bytes))
        .merge(chat_routes())
        .merge(session_routes())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        // The dashboard is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    metrics_port: u16,
    analyzer: GuardedAnalyzer,
    chatbot: GuardedChatbot,
    persistence: GuardedPersistence,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, analyzer, chatbot, persistence);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let metrics_listener =
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port)).await?;

    info!("Listening on port {}", port);
    info!("Serving metrics on port {}", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        result = axum::serve(metrics_listener, make_metrics_app()).into_future() => result?,
    }
    Ok(())
}
