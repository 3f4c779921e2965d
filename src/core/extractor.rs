//! Extractor collaborator — the boundary to the external yt-dlp tool
//!
//! Everything hard about video downloading (site support, format
//! negotiation, anti-bot evasion) lives in yt-dlp. This module only shells
//! out to it: metadata queries via `--dump-json`, transfers via a spawned
//! child whose `--newline` output is streamed back as progress updates.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::ExtractorConfig;
use crate::core::models::{
    AppError, AppResult, DownloadRequest, FormatDescriptor, VideoMetadata,
};
use crate::core::progress::{parse_output_line, OutputEvent, ProgressCallback, ProgressUpdate};

/// Trait for the extractor collaborator.
///
/// The session tracker only depends on this seam; tests substitute a mock.
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Query metadata for a URL without downloading anything.
    async fn fetch_info(&self, url: &Url) -> AppResult<VideoMetadata>;

    /// Transfer the media to disk, reporting progress through the callback.
    /// Returns the name of the resulting file inside `request.output_dir`.
    async fn download(
        &self,
        request: DownloadRequest,
        on_progress: ProgressCallback,
    ) -> AppResult<String>;
}

/// Extractor implementation backed by the yt-dlp binary.
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Locate the yt-dlp executable: explicit config, well-known install
    /// paths, then PATH.
    fn binary(&self) -> PathBuf {
        if let Some(path) = &self.config.binary_path {
            return path.clone();
        }

        let common_paths = [
            "/usr/local/bin/yt-dlp",
            "/usr/bin/yt-dlp",
            "/opt/homebrew/bin/yt-dlp",
        ];

        for path in common_paths {
            if Path::new(path).exists() {
                return PathBuf::from(path);
            }
        }

        PathBuf::from("yt-dlp")
    }

    /// Flags shared by info queries and downloads.
    fn base_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            self.config.retries.to_string(),
            "--no-check-certificates".to_string(),
            "--user-agent".to_string(),
            self.config.user_agent.clone(),
            "--referer".to_string(),
            self.config.referer.clone(),
        ]
    }

    /// Format selector with fallbacks, mirroring what the web UI offers:
    /// "best" degrades through capped heights, an explicit format id is
    /// paired with the best audio stream.
    fn format_selector(format_id: &str) -> String {
        if format_id == "best" {
            "best[height<=1080]/best[height<=720]/best[height<=480]/best".to_string()
        } else {
            format!("{}+bestaudio/bestaudio/best", format_id)
        }
    }
}

#[async_trait]
impl VideoExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_info(&self, url: &Url) -> AppResult<VideoMetadata> {
        let binary = self.binary();
        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.base_args());
        args.push(url.to_string());

        debug!("Fetching video info: {} {:?}", binary.display(), url.as_str());

        let mut command = Command::new(&binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let timeout = std::time::Duration::from_secs(self.config.info_timeout_secs);
        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| {
                AppError::ExtractionFailed(format!(
                    "Timed out fetching video info after {}s",
                    self.config.info_timeout_secs
                ))
            })?
            .map_err(|e| spawn_failure(&binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ExtractionFailed(classify_failure(&stderr)));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            AppError::ExtractionFailed(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(parse_video_metadata(&json))
    }

    async fn download(
        &self,
        request: DownloadRequest,
        on_progress: ProgressCallback,
    ) -> AppResult<String> {
        let binary = self.binary();

        let template = match &request.custom_filename {
            Some(name) => name.clone(),
            None => "%(title)s.%(ext)s".to_string(),
        };

        let mut args = vec![
            "-f".to_string(),
            Self::format_selector(&request.format_id),
            "--newline".to_string(),
            "--fragment-retries".to_string(),
            self.config.fragment_retries.to_string(),
            "--skip-unavailable-fragments".to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--remux-video".to_string(),
            "mp4".to_string(),
            "-P".to_string(),
            request.output_dir.to_string_lossy().into_owned(),
            "-o".to_string(),
            template,
        ];
        args.extend(self.base_args());
        args.push(request.url.to_string());

        info!(
            "Starting yt-dlp download: url={} format={}",
            request.url, request.format_id
        );

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_failure(&binary, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            AppError::ExtractionFailed("Failed to capture yt-dlp stdout".to_string())
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            AppError::ExtractionFailed("Failed to capture yt-dlp stderr".to_string())
        })?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        // The merger line wins over per-stream destinations: DASH downloads
        // emit one destination per stream before the final container.
        let mut destination: Option<String> = None;
        let mut merge_target: Option<String> = None;

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_output_line(&line) {
                Some(OutputEvent::Progress(update)) => on_progress(update),
                Some(OutputEvent::Destination(path)) => {
                    on_progress(ProgressUpdate {
                        percent: 0.0,
                        message: format!("Starting: {}", file_name_of(&path)),
                    });
                    destination = Some(path);
                }
                Some(OutputEvent::MergeTarget(path)) => {
                    on_progress(ProgressUpdate {
                        percent: 99.0,
                        message: "Merging video and audio...".to_string(),
                    });
                    merge_target = Some(path);
                }
                Some(OutputEvent::AlreadyDownloaded(path)) => {
                    on_progress(ProgressUpdate {
                        percent: 100.0,
                        message: "File already downloaded".to_string(),
                    });
                    destination = Some(path);
                }
                None => {}
            }
        }

        let status = child.wait().await.map_err(|e| {
            AppError::ExtractionFailed(format!("Failed to wait for yt-dlp: {}", e))
        })?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            warn!("yt-dlp exited with {}: {}", status, tail(&stderr_output));
            return Err(AppError::ExtractionFailed(classify_failure(&stderr_output)));
        }

        let final_path = merge_target.or(destination).ok_or_else(|| {
            AppError::ExtractionFailed(
                "yt-dlp finished without reporting an output file".to_string(),
            )
        })?;

        Ok(file_name_of(&final_path))
    }
}

fn spawn_failure(binary: &Path, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AppError::ExtractionFailed(format!(
            "yt-dlp executable not found at {:?}; install yt-dlp or set extractor.binary_path",
            binary
        ))
    } else {
        AppError::ExtractionFailed(format!("Failed to start yt-dlp: {}", err))
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn tail(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .to_string()
}

/// Map raw yt-dlp stderr onto the user-facing messages the UI shows.
pub fn classify_failure(stderr: &str) -> String {
    if stderr.contains("HTTP Error 403") {
        return "Access denied. This video may be private, region-restricted, or require \
                authentication. Please try a different video."
            .to_string();
    }
    if stderr.contains("Video unavailable") {
        return "This video is unavailable. It may have been removed or made private.".to_string();
    }
    if stderr.contains("Requested format is not available") {
        return "The requested video format is not available. Please try selecting a different \
                quality option."
            .to_string();
    }
    if stderr.contains("Sign in to confirm your age") {
        return "This video requires age verification. Please try a different video.".to_string();
    }
    if stderr.contains("No video formats found") {
        return "No downloadable video formats found. This site may not be supported.".to_string();
    }
    if stderr.contains("Unsupported URL") {
        return "This URL is not supported. Please try a video from a supported platform."
            .to_string();
    }

    let detail = tail(stderr);
    if detail.is_empty() {
        "Download failed for an unknown reason".to_string()
    } else {
        format!("Download failed: {}", detail)
    }
}

/// Build `VideoMetadata` from a yt-dlp `--dump-json` document.
fn parse_video_metadata(json: &serde_json::Value) -> VideoMetadata {
    let description = json["description"].as_str().unwrap_or("");
    let description = if description.chars().count() > 200 {
        let truncated: String = description.chars().take(200).collect();
        format!("{}...", truncated)
    } else {
        description.to_string()
    };

    VideoMetadata {
        title: json["title"].as_str().unwrap_or("Unknown Title").to_string(),
        duration_secs: json["duration"].as_f64().unwrap_or(0.0) as u64,
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
        view_count: json["view_count"].as_u64().unwrap_or(0),
        description,
        thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
        formats: extract_formats(json),
    }
}

/// Distill the extractor's format list for the UI: drop audio-only entries,
/// sort by resolution then audio presence, cap the list.
fn extract_formats(json: &serde_json::Value) -> Vec<FormatDescriptor> {
    let mut formats = Vec::new();

    let raw = match json["formats"].as_array() {
        Some(raw) => raw,
        None => return formats,
    };

    for fmt in raw {
        // Audio-only entries are folded into the selector, not listed.
        if fmt["vcodec"].as_str() == Some("none") {
            continue;
        }

        // Entries with neither a size nor a URL are not fetchable.
        if fmt["filesize"].as_u64().unwrap_or(0) == 0 && fmt["url"].as_str().is_none() {
            continue;
        }

        let height = fmt["height"].as_u64().unwrap_or(0);
        let filesize = fmt["filesize"].as_u64().unwrap_or(0);
        let file_size = if filesize > 0 {
            format!("{:.1} MB", filesize as f64 / (1024.0 * 1024.0))
        } else {
            "Unknown".to_string()
        };

        let mut format_note = fmt["format_note"].as_str().unwrap_or("").to_string();
        if format_note.is_empty() && height > 0 {
            format_note = match height {
                h if h >= 1080 => "High Quality",
                h if h >= 720 => "Medium Quality",
                h if h >= 480 => "Standard Quality",
                _ => "Low Quality",
            }
            .to_string();
        }

        formats.push(FormatDescriptor {
            format_id: fmt["format_id"].as_str().unwrap_or("N/A").to_string(),
            resolution: fmt["resolution"].as_str().unwrap_or("N/A").to_string(),
            height,
            width: fmt["width"].as_u64().unwrap_or(0),
            extension: fmt["ext"].as_str().unwrap_or("N/A").to_string(),
            file_size,
            has_audio: fmt["acodec"].as_str().map_or(false, |a| a != "none"),
            format_note,
        });
    }

    formats.sort_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then(b.has_audio.cmp(&a.has_audio))
    });
    formats.truncate(15);
    formats
}
