//! Filename handling helpers

/// Reduce a caller-supplied filename to something safe to join onto the
/// output directory: whitespace becomes underscores, everything outside
/// `[A-Za-z0-9_.-]` is dropped, and leading/trailing dots are stripped.
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_names() {
        assert_eq!(sanitize_filename("video.mp4"), Some("video.mp4".to_string()));
        assert_eq!(
            sanitize_filename("My_Clip-01.mkv"),
            Some("My_Clip-01.mkv".to_string())
        );
    }

    #[test]
    fn replaces_whitespace_and_drops_specials() {
        assert_eq!(
            sanitize_filename("my cool video.mp4"),
            Some("my_cool_video.mp4".to_string())
        );
        assert_eq!(
            sanitize_filename("a/b\\c:d.mp4"),
            Some("abcd.mp4".to_string())
        );
    }

    #[test]
    fn strips_traversal_attempts() {
        assert_eq!(sanitize_filename("../../etc/passwd"), Some("etcpasswd".to_string()));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   "), None);
    }
}
