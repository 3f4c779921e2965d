//! URL and input validation utilities

use url::Url;

use crate::core::models::{AppError, AppResult};

/// Parse and validate a video page URL.
///
/// Only absolute http/https URLs with a host are accepted; everything else
/// is an `InvalidUrl` before any extractor work happens.
pub fn parse_video_url(raw: &str) -> AppResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| AppError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(AppError::InvalidUrl(format!("{} has no host", trimmed)));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_http_urls() {
        assert!(parse_video_url("https://example.com/v/1").is_ok());
        assert!(parse_video_url("http://example.com/watch?v=abc").is_ok());
        assert!(parse_video_url("  https://example.com/v/1  ").is_ok());
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "   ",
            "not a url",
            "example.com/video",
            "ftp://example.com/file",
            "file:///etc/passwd",
            "https://",
        ] {
            assert!(
                matches!(parse_video_url(bad), Err(AppError::InvalidUrl(_))),
                "expected InvalidUrl for {:?}",
                bad
            );
        }
    }
}
