//! Input validation and sanitization.
//!
//! This module provides:
//! - Media reference validation (uploaded paths and remote URLs)
//! - Free-text sanitization for instructions and chat messages

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

/// Maximum URL or path length.
const MAX_REF_LENGTH: usize = 2048;

/// Maximum instructions length.
pub const MAX_INSTRUCTIONS_LENGTH: usize = 5000;

/// Maximum chat message length.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Upload kinds accepted by the upload endpoint.
pub const UPLOAD_TYPES: &[&str] = &["main", "reference"];

/// Blocked URL patterns (internal endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://127\.",
        r"^https?://localhost",
        r"^https?://10\.",
        r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.",
        r"^https?://192\.168\.",
        r"^https?://169\.254\.",
        r"^https?://\[::1\]",
        r"^https?://\[fd",
        r"^https?://\[fe80",
        r"^https?://metadata\.",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Validate a media reference from a job request.
///
/// Accepts `http(s)` URLs that do not target internal hosts, and relative
/// media paths (as returned by the upload endpoint) that cannot escape the
/// media root.
pub fn validate_media_ref(input: &str) -> Result<String, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("video reference cannot be empty".to_string());
    }
    if input.len() > MAX_REF_LENGTH {
        return Err(format!(
            "video reference exceeds maximum length of {} characters",
            MAX_REF_LENGTH
        ));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let parsed = Url::parse(input).map_err(|e| format!("invalid URL: {}", e))?;
        if parsed.host_str().is_none() {
            return Err("URL must have a valid host".to_string());
        }
        let lower = input.to_lowercase();
        if BLOCKED_PATTERNS.iter().any(|p| p.is_match(&lower)) {
            warn!(url = %input, "Blocked URL pattern detected");
            return Err("URL appears to target an internal or restricted endpoint".to_string());
        }
        return Ok(input.to_string());
    }

    if input.contains("://") {
        return Err("only http and https URLs are supported".to_string());
    }

    if !is_safe_relative_path(input) {
        return Err("video path must be relative to the media root".to_string());
    }

    Ok(input.to_string())
}

/// Relative `/`-separated path without traversal.
fn is_safe_relative_path(path: &str) -> bool {
    !path.starts_with('/')
        && !path.contains('\\')
        && !path.contains('\0')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Strip control characters (except newlines and tabs) and truncate.
pub fn sanitize_string(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_paths_are_valid() {
        assert_eq!(
            validate_media_ref(" uploads/main/clip.mp4 ").unwrap(),
            "uploads/main/clip.mp4"
        );
        assert!(validate_media_ref("video.mp4").is_ok());
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        assert!(validate_media_ref("../etc/passwd").is_err());
        assert!(validate_media_ref("uploads/../../secret").is_err());
        assert!(validate_media_ref("/etc/passwd").is_err());
        assert!(validate_media_ref("uploads\\main\\clip.mp4").is_err());
        assert!(validate_media_ref("").is_err());
    }

    #[test]
    fn test_remote_urls() {
        assert!(validate_media_ref("https://cdn.example.com/clip.mp4").is_ok());
        assert!(validate_media_ref("http://127.0.0.1/clip.mp4").is_err());
        assert!(validate_media_ref("http://169.254.169.254/latest/meta-data/").is_err());
        assert!(validate_media_ref("ftp://example.com/clip.mp4").is_err());
        assert!(validate_media_ref("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("make it\u{0007} punchy\n", 100), "make it punchy\n");
        assert_eq!(sanitize_string("abcdef", 3), "abc");
    }
}
