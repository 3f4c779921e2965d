//! Core data models for the video downloader backend

use serde::{Deserialize, Serialize};

/// Session state enumeration
///
/// `FetchingInfo` and `Downloading` are the busy states: while the tracker is
/// in either of them, new info fetches and download starts are rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FetchingInfo,
    Downloading,
    Completed,
    Failed,
}

impl SessionState {
    /// Busy states hold the single-download mutual-exclusion lock.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::FetchingInfo | Self::Downloading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of the one tracked download session.
///
/// Invariant: exactly one of `result_filename` / `error_detail` is set in a
/// terminal state, neither in a non-terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSession {
    /// Generated token for the current download; `None` while idle.
    pub id: Option<String>,

    pub source_url: Option<String>,

    pub format_id: Option<String>,

    pub state: SessionState,

    /// 0–100; non-decreasing while `Downloading`, frozen on failure.
    pub progress_percent: f64,

    pub status_message: String,

    pub result_filename: Option<String>,

    pub error_detail: Option<String>,
}

impl Default for DownloadSession {
    fn default() -> Self {
        Self {
            id: None,
            source_url: None,
            format_id: None,
            state: SessionState::Idle,
            progress_percent: 0.0,
            status_message: String::new(),
            result_filename: None,
            error_detail: None,
        }
    }
}

/// Video information returned by an info fetch; never stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,

    pub duration_secs: u64,

    pub uploader: String,

    pub view_count: u64,

    pub description: String,

    pub thumbnail: String,

    /// Sorted by (height, has_audio) descending; the first entry is the
    /// recommended default.
    pub formats: Vec<FormatDescriptor>,
}

/// One selectable quality/container variant of a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,

    pub resolution: String,

    pub height: u64,

    pub width: u64,

    pub extension: String,

    /// Humanized size ("12.3 MB") or "Unknown".
    pub file_size: String,

    pub has_audio: bool,

    pub format_note: String,
}

/// Read-only view of one file in the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub name: String,

    pub size: u64,

    pub modified: chrono::DateTime<chrono::Utc>,
}

/// Parameters for one download handed to the extractor.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: url::Url,

    pub format_id: String,

    pub output_dir: std::path::PathBuf,

    pub custom_filename: Option<String>,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    ExtractionFailed(String),

    #[error("A download is already in progress")]
    SessionBusy,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Downloads directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Invalid file name: {0}")]
    InvalidFilename(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_terminal_states_are_disjoint() {
        for state in [
            SessionState::Idle,
            SessionState::FetchingInfo,
            SessionState::Downloading,
            SessionState::Completed,
            SessionState::Failed,
        ] {
            assert!(!(state.is_busy() && state.is_terminal()));
        }
        assert!(SessionState::FetchingInfo.is_busy());
        assert!(SessionState::Downloading.is_busy());
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Idle.is_busy());
        assert!(!SessionState::Idle.is_terminal());
    }

    #[test]
    fn default_session_is_idle_with_cleared_fields() {
        let session = DownloadSession::default();
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.id.is_none());
        assert!(session.result_filename.is_none());
        assert!(session.error_detail.is_none());
        assert_eq!(session.progress_percent, 0.0);
    }
}
