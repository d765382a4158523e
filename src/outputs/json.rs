//! JSON output.
//!
//! Records are written as a pretty-printed array with a 4-space indent.
//! Non-ASCII text is kept as-is. An empty run still produces `[]`.
//! [`read_json`] loads such a file back for the AI steps.

use crate::models::ScrapeOutcome;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize records with a 4-space indent.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write the records of `outcome` to `path`.
///
/// # Returns
///
/// `Ok(false)` for the error shape, `Ok(true)` once the file is written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json(outcome: &ScrapeOutcome, path: &Path) -> Result<bool, Box<dyn Error>> {
    let Some(records) = outcome.records() else {
        return Ok(false);
    };

    let json = to_pretty_json(records)?;
    fs::write(path, json).await?;

    let total_images: usize = records.iter().map(|r| r.images.len()).sum();
    let total_local: usize = records.iter().map(|r| r.local_images.len()).sum();
    info!(
        records = records.len(),
        images = total_images,
        local_images = total_local,
        "Wrote JSON file"
    );
    Ok(true)
}

/// Load a file written by [`write_json`].
///
/// An `{"error": "..."}` object is accepted as the error shape.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_json(path: &Path) -> Result<ScrapeOutcome, Box<dyn Error>> {
    let raw = fs::read(path).await?;
    let outcome: ScrapeOutcome = serde_json::from_slice(&raw)?;
    if let Some(records) = outcome.records() {
        info!(records = records.len(), "Loaded saved records");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsRecord, sample_record};

    #[tokio::test]
    async fn test_write_json_pretty_and_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crypto_news.json");
        let outcome = ScrapeOutcome::Records(vec![sample_record("Ether → $4k", None)]);

        assert!(write_json(&outcome, &path).await.unwrap());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n    {\n        \"title\": \"Ether → $4k\""));
        let back: Vec<NewsRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(back[0].title, "Ether → $4k");
    }

    #[tokio::test]
    async fn test_write_json_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        assert!(write_json(&ScrapeOutcome::Records(vec![]), &path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_read_json_loads_saved_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let outcome = ScrapeOutcome::Records(vec![
            sample_record("First", Some("https://crypto.news/first")),
            sample_record("Second", None),
        ]);
        write_json(&outcome, &path).await.unwrap();

        assert_eq!(read_json(&path).await.unwrap(), outcome);
    }

    #[tokio::test]
    async fn test_read_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_json(&dir.path().join("missing.json")).await.is_err());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"title\": 1}").unwrap();
        assert!(read_json(&bad).await.is_err());

        let failed = dir.path().join("failed.json");
        std::fs::write(&failed, r#"{"error": "HTTP 503"}"#).unwrap();
        assert!(matches!(
            read_json(&failed).await.unwrap(),
            ScrapeOutcome::Failed { error } if error == "HTTP 503"
        ));
    }

    #[tokio::test]
    async fn test_write_json_skips_error_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.json");
        let outcome = ScrapeOutcome::Failed {
            error: "boom".to_string(),
        };

        assert!(!write_json(&outcome, &path).await.unwrap());
        assert!(!path.exists());
    }
}
