//! HTTP surface for the downloader backend
//!
//! Thin presentation layer: every handler delegates to the session tracker,
//! the file registry, or the configuration and maps the outcome onto the
//! JSON shapes the frontend expects.

use anyhow::Context;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::extractor::{VideoExtractor, YtDlpExtractor};
use crate::core::session::SessionTracker;

pub mod routes;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<SessionTracker>,
    pub config: Arc<RwLock<AppConfig>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let extractor = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
        Self::with_extractor(extractor, config)
    }

    /// Build state around an arbitrary extractor implementation.
    pub fn with_extractor(extractor: Arc<dyn VideoExtractor>, config: AppConfig) -> Self {
        let config = Arc::new(RwLock::new(config));
        let tracker = Arc::new(SessionTracker::new(extractor, Arc::clone(&config)));
        Self { tracker, config }
    }
}

/// Error response for the file and settings routes, which use HTTP status
/// codes (the download routes answer with a `success` envelope instead).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, headers, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/info", post(routes::download::video_info))
        .route("/api/download", post(routes::download::start_download))
        .route("/api/status", get(routes::download::download_status))
        .route("/api/reset", post(routes::download::reset_session))
        .route("/api/cancel", post(routes::download::cancel_download))
        .route("/api/downloads", get(routes::files::list_downloads))
        .route("/api/downloads/{filename}", get(routes::files::fetch_download))
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .with_state(state)
}

/// Bind the listener and run until a shutdown signal arrives.
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
