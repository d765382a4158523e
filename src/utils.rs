//! Utility functions for string manipulation and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging model responses
//! - File-name sanitization for generated pages
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Turn an article title into a file stem.
///
/// Spaces and path separators become underscores, anything that is not
/// alphanumeric, `_` or `-` is dropped, and the result is cut to
/// `max_chars` characters. Falls back to `"article"` when nothing is left.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(safe_file_stem("Bitcoin hits $100k!", 50), "Bitcoin_hits_100k");
/// ```
pub fn safe_file_stem(title: &str, max_chars: usize) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, ' ' | '/' | '\\') { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
        .take(max_chars)
        .collect();
    if stem.is_empty() {
        "article".to_string()
    } else {
        stem
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let result = truncate_for_log("ééé", 3);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Bitcoin hits $100k!", 50), "Bitcoin_hits_100k");
        assert_eq!(safe_file_stem("ETH/BTC ratio", 50), "ETH_BTC_ratio");
        assert_eq!(safe_file_stem("Trump-Xi 'situationship'", 50), "Trump-Xi_situationship");
        assert_eq!(safe_file_stem("???", 50), "article");
        assert_eq!(safe_file_stem(&"x".repeat(80), 50).len(), 50);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
