//! Runtime settings routes
//!
//! Exposes the download section of the configuration: the frontend can read
//! and change the output directory, preferred format, and watchdog limit.
//! Updates are validated, persisted, and take effect for the next download.

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::core::config::DownloadConfig;
use crate::server::{ApiError, ApiResult, AppState};

pub async fn get_settings(State(state): State<AppState>) -> Json<DownloadConfig> {
    let config = state.config.read().await;
    Json(config.download.clone())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(download): Json<DownloadConfig>,
) -> ApiResult<Json<DownloadConfig>> {
    if download.output_directory.as_os_str().is_empty() {
        return Err(ApiError::bad_request("download path cannot be empty"));
    }

    let mut config = state.config.write().await;

    // Persist a validated copy before committing it to the running state.
    let mut updated = config.clone();
    updated.download = download;
    updated
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    updated
        .save()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    *config = updated;
    info!(
        "Settings updated: output directory {:?}",
        config.download.output_directory
    );

    Ok(Json(config.download.clone()))
}
