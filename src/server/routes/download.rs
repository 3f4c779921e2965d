//! Download lifecycle routes
//!
//! The info/download/reset/cancel routes answer with the `success` envelope
//! the frontend polls against; failures are reported inside the envelope at
//! HTTP 200, never as transport errors. The status route returns the raw
//! session snapshot.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::models::{AppResult, DownloadSession, VideoMetadata};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StartDownloadRequest {
    pub url: String,
    pub format: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    fn from_result(result: AppResult<()>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<VideoMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn video_info(
    State(state): State<AppState>,
    Json(request): Json<InfoRequest>,
) -> Json<InfoResponse> {
    match state.tracker.begin_info_fetch(&request.url).await {
        Ok(info) => Json(InfoResponse {
            success: true,
            info: Some(info),
            error: None,
        }),
        Err(e) => Json(InfoResponse {
            success: false,
            info: None,
            error: Some(e.to_string()),
        }),
    }
}

pub async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<StartDownloadRequest>,
) -> Json<ActionResponse> {
    let format = match request.format {
        Some(format) if !format.trim().is_empty() => format,
        _ => {
            let config = state.config.read().await;
            config
                .download
                .preferred_format
                .clone()
                .unwrap_or_else(|| "best".to_string())
        }
    };

    let filename = request
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let result = state
        .tracker
        .start_download(&request.url, &format, filename)
        .await;

    Json(ActionResponse::from_result(result))
}

pub async fn download_status(State(state): State<AppState>) -> Json<DownloadSession> {
    Json(state.tracker.get_status())
}

pub async fn reset_session(State(state): State<AppState>) -> Json<ActionResponse> {
    Json(ActionResponse::from_result(state.tracker.reset()))
}

pub async fn cancel_download(State(state): State<AppState>) -> Json<ActionResponse> {
    Json(ActionResponse::from_result(state.tracker.cancel()))
}
