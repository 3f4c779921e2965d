//! Session tracker — the download lifecycle state machine
//!
//! Tracks at most one in-flight download. Requests that would start a second
//! concurrent operation are rejected rather than queued; that at-most-one
//! contract is the tracker's main job. The background download runs as a
//! task owned by the tracker and publishes progress into a shared snapshot
//! cell read by status polls.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::AppConfig;
use crate::core::extractor::VideoExtractor;
use crate::core::models::{
    AppError, AppResult, DownloadRequest, DownloadSession, SessionState, VideoMetadata,
};
use crate::core::progress::ProgressCallback;
use crate::utils::file_utils::sanitize_filename;
use crate::utils::validation::parse_video_url;

pub struct SessionTracker {
    /// The one session snapshot. Held only for short, non-awaiting critical
    /// sections so polls always observe a consistent state.
    session: Arc<RwLock<DownloadSession>>,

    /// Handle of the background download task, kept for cancellation.
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,

    extractor: Arc<dyn VideoExtractor>,

    config: Arc<tokio::sync::RwLock<AppConfig>>,
}

impl SessionTracker {
    pub fn new(
        extractor: Arc<dyn VideoExtractor>,
        config: Arc<tokio::sync::RwLock<AppConfig>>,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(DownloadSession::default())),
            worker: Mutex::new(None),
            extractor,
            config,
        }
    }

    /// Query metadata for a URL. Stateless with respect to the session: the
    /// tracker passes through `FetchingInfo` while the extractor runs and
    /// returns to `Idle` afterwards, success or not.
    pub async fn begin_info_fetch(&self, raw_url: &str) -> AppResult<VideoMetadata> {
        let url = parse_video_url(raw_url)?;

        {
            let mut session = self.session.write();
            if session.state.is_busy() {
                return Err(AppError::SessionBusy);
            }
            // Entering FetchingInfo from a terminal state implicitly resets
            // the finished session.
            *session = DownloadSession {
                state: SessionState::FetchingInfo,
                status_message: "Fetching video information...".to_string(),
                ..DownloadSession::default()
            };
        }

        let result = self.extractor.fetch_info(&url).await;

        {
            let mut session = self.session.write();
            if session.state == SessionState::FetchingInfo {
                *session = DownloadSession::default();
            }
        }

        result
    }

    /// Start a download in the background and return immediately.
    ///
    /// Fails with `SessionBusy` while an info fetch or another download is in
    /// flight. A session in a terminal state is replaced.
    pub async fn start_download(
        &self,
        raw_url: &str,
        format_id: &str,
        custom_filename: Option<&str>,
    ) -> AppResult<()> {
        let url = parse_video_url(raw_url)?;

        let custom_filename = match custom_filename {
            Some(name) => Some(
                sanitize_filename(name)
                    .ok_or_else(|| AppError::InvalidFilename(name.to_string()))?,
            ),
            None => None,
        };

        let (output_dir, max_duration) = {
            let config = self.config.read().await;
            (
                config.download.output_directory.clone(),
                config.max_download_duration(),
            )
        };

        let id = Uuid::new_v4().to_string();

        {
            let mut session = self.session.write();
            if session.state.is_busy() {
                return Err(AppError::SessionBusy);
            }
            *session = DownloadSession {
                id: Some(id.clone()),
                source_url: Some(url.to_string()),
                format_id: Some(format_id.to_string()),
                state: SessionState::Downloading,
                progress_percent: 0.0,
                status_message: "Starting download...".to_string(),
                result_filename: None,
                error_detail: None,
            };
        }

        let request = DownloadRequest {
            url,
            format_id: format_id.to_string(),
            output_dir,
            custom_filename,
        };

        let extractor = Arc::clone(&self.extractor);
        let session = Arc::clone(&self.session);
        let handle = tokio::spawn(async move {
            let on_progress = progress_sink(Arc::clone(&session), id.clone());

            let download = extractor.download(request, on_progress);
            let result = match max_duration {
                Some(limit) => match tokio::time::timeout(limit, download).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::ExtractionFailed(format!(
                        "Download exceeded the maximum duration of {}s and was aborted",
                        limit.as_secs()
                    ))),
                },
                None => download.await,
            };

            let mut session = session.write();
            // A cancel (or a newer session) already moved the state on; this
            // task no longer owns the session then.
            if session.id.as_deref() != Some(id.as_str())
                || session.state != SessionState::Downloading
            {
                return;
            }

            match result {
                Ok(filename) => {
                    info!("Download completed: {}", filename);
                    session.state = SessionState::Completed;
                    session.progress_percent = 100.0;
                    session.status_message = "Download completed!".to_string();
                    session.result_filename = Some(filename);
                }
                Err(e) => {
                    warn!("Download failed: {}", e);
                    session.state = SessionState::Failed;
                    session.status_message = "Download failed".to_string();
                    session.error_detail = Some(e.to_string());
                    // progress_percent keeps its last reported value
                }
            }
        });

        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Snapshot of the current session. Never blocks on the download itself.
    pub fn get_status(&self) -> DownloadSession {
        self.session.read().clone()
    }

    /// Return a finished tracker to `Idle`. No-op when already idle.
    pub fn reset(&self) -> AppResult<()> {
        let mut session = self.session.write();
        match session.state {
            SessionState::Idle => Ok(()),
            SessionState::Completed | SessionState::Failed => {
                *session = DownloadSession::default();
                Ok(())
            }
            SessionState::FetchingInfo | SessionState::Downloading => {
                Err(AppError::InvalidTransition(
                    "cannot reset while an operation is in progress".to_string(),
                ))
            }
        }
    }

    /// Abort the in-flight download: the session fails with a distinguished
    /// cause and the extractor's process is torn down with the task.
    pub fn cancel(&self) -> AppResult<()> {
        {
            let mut session = self.session.write();
            if session.state != SessionState::Downloading {
                return Err(AppError::InvalidTransition(
                    "no download in progress to cancel".to_string(),
                ));
            }
            session.state = SessionState::Failed;
            session.status_message = "Download cancelled".to_string();
            session.error_detail = Some("Download cancelled by user".to_string());
            // progress_percent keeps its last reported value
        }

        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }

        info!("Download cancelled");
        Ok(())
    }
}

/// Build the callback the extractor drives from the background task.
///
/// Updates are dropped once the session left `Downloading` or was replaced,
/// and the reported percentage never decreases within one episode (a
/// multi-stream download restarts yt-dlp's own counter per stream).
fn progress_sink(session: Arc<RwLock<DownloadSession>>, id: String) -> ProgressCallback {
    Arc::new(move |update| {
        let mut session = session.write();
        if session.id.as_deref() != Some(id.as_str())
            || session.state != SessionState::Downloading
        {
            return;
        }
        if update.percent >= session.progress_percent {
            session.progress_percent = update.percent.clamp(0.0, 100.0);
            session.status_message = update.message;
        }
    })
}
