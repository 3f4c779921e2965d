//! File listing and delivery routes

use axum::body::Body;
use axum::extract::{Path as AxumPath, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mime_guess::MimeGuess;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::core::models::DownloadedFile;
use crate::core::registry::FileRegistry;
use crate::server::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<DownloadedFile>,
}

async fn registry(state: &AppState) -> FileRegistry {
    let config = state.config.read().await;
    FileRegistry::new(config.download.output_directory.clone())
}

pub async fn list_downloads(State(state): State<AppState>) -> ApiResult<Json<FileListResponse>> {
    let files = registry(&state)
        .await
        .list_files()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(FileListResponse { files }))
}

pub async fn fetch_download(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> ApiResult<Response> {
    let path = registry(&state)
        .await
        .resolve(&filename)
        .map_err(|_| ApiError::not_found("file not found"))?;

    stream_file(path).await
}

async fn stream_file(path: PathBuf) -> ApiResult<Response> {
    let file = File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("file not found"))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|_| ApiError::not_found("file not found"))?;

    if !metadata.is_file() {
        return Err(ApiError::not_found("file not found"));
    }

    let stream = ReaderStream::new(file);
    let mut response = Body::from_stream(stream).into_response();

    response.headers_mut().insert(
        header::CONTENT_LENGTH,
        metadata.len().to_string().parse().unwrap(),
    );
    if let Some(mime) = MimeGuess::from_path(&path).first() {
        if let Ok(value) = mime.to_string().parse() {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }

    Ok(response)
}
