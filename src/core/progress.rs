//! Parsing of yt-dlp `--newline` output into progress updates
//!
//! The extractor reports transfer progress as plain text lines; this module
//! turns the interesting ones into `ProgressUpdate` values delivered to the
//! session tracker through a callback.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One progress report from the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub percent: f64,
    pub message: String,
}

/// Callback invoked from the background download task for each update.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Events carried by individual output lines that the downloader cares about
/// beyond the raw percentage.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Progress(ProgressUpdate),
    /// `[download] Destination: <path>` — the file yt-dlp is writing.
    Destination(String),
    /// `[Merger] Merging formats into "<path>"` — final container path.
    MergeTarget(String),
    /// The file was already present on disk.
    AlreadyDownloaded(String),
}

lazy_static! {
    // [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)\s+at\s+(\d+\.?\d*\s*\w+/s)(?:\s+ETA\s+(\S+))?"
    )
    .unwrap();
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref MERGE_RE: Regex =
        Regex::new(r#"\[Merger\]\s+Merging formats into\s+"(.+)""#).unwrap();
    static ref ALREADY_RE: Regex =
        Regex::new(r"\[download\]\s+(.+?)\s+has already been downloaded").unwrap();
}

/// Classify a single line of yt-dlp output.
///
/// Returns `None` for lines that carry nothing of interest (the vast
/// majority of the tool's output).
pub fn parse_output_line(line: &str) -> Option<OutputEvent> {
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str()).unwrap_or("?");
        let eta = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        let message = if eta.is_empty() {
            format!("Downloading: {:.1}% of {} at {}", percent, size, speed)
        } else {
            format!(
                "Downloading: {:.1}% of {} at {} ETA {}",
                percent, size, speed, eta
            )
        };

        return Some(OutputEvent::Progress(ProgressUpdate { percent, message }));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        return Some(OutputEvent::Destination(caps.get(1)?.as_str().to_string()));
    }

    if let Some(caps) = MERGE_RE.captures(line) {
        return Some(OutputEvent::MergeTarget(caps.get(1)?.as_str().to_string()));
    }

    if let Some(caps) = ALREADY_RE.captures(line) {
        return Some(OutputEvent::AlreadyDownloaded(
            caps.get(1)?.as_str().to_string(),
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fragment_progress_line() {
        let line = "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)";
        match parse_output_line(line) {
            Some(OutputEvent::Progress(update)) => {
                assert!((update.percent - 6.2).abs() < f64::EPSILON);
                assert!(update.message.contains("6.2%"));
                assert!(update.message.contains("ETA 12:32"));
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn parses_plain_progress_line_without_eta() {
        let line = "[download] 100% of 10.00MiB at 2.50MiB/s";
        match parse_output_line(line) {
            Some(OutputEvent::Progress(update)) => {
                assert_eq!(update.percent, 100.0);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn parses_destination_line() {
        let line = "[download] Destination: downloads/My Video.f137.mp4";
        assert_eq!(
            parse_output_line(line),
            Some(OutputEvent::Destination(
                "downloads/My Video.f137.mp4".to_string()
            ))
        );
    }

    #[test]
    fn parses_merger_line() {
        let line = r#"[Merger] Merging formats into "downloads/My Video.mp4""#;
        assert_eq!(
            parse_output_line(line),
            Some(OutputEvent::MergeTarget("downloads/My Video.mp4".to_string()))
        );
    }

    #[test]
    fn detects_already_downloaded() {
        let line = "[download] downloads/My Video.mp4 has already been downloaded";
        assert_eq!(
            parse_output_line(line),
            Some(OutputEvent::AlreadyDownloaded(
                "downloads/My Video.mp4".to_string()
            ))
        );
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert_eq!(parse_output_line("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_output_line(""), None);
    }
}
