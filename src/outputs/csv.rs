//! CSV output.
//!
//! One header row with the record field names, then one row per record.
//! List-valued fields (`tags`, `images`, `local_images`) are stored as JSON
//! text in their cell. Quoting follows RFC 4180: a cell is quoted when it
//! contains a comma, quote, CR or LF, and embedded quotes are doubled.

use crate::models::{NewsRecord, ScrapeOutcome};
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Column order of the CSV file.
pub const COLUMNS: &[&str] = &[
    "title",
    "url",
    "timestamp",
    "tags",
    "summary",
    "content",
    "scraped_at",
    "images",
    "local_images",
];

/// Write the records of `outcome` to `path`.
///
/// # Returns
///
/// `Ok(false)` for the error shape or an empty run, `Ok(true)` once written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_csv(outcome: &ScrapeOutcome, path: &Path) -> Result<bool, Box<dyn Error>> {
    let Some(records) = outcome.records().filter(|r| !r.is_empty()) else {
        return Ok(false);
    };

    fs::write(path, render_csv(records)?).await?;
    info!(records = records.len(), "Wrote CSV file");
    Ok(true)
}

/// Render records as CSV text with CRLF row endings.
pub fn render_csv(records: &[NewsRecord]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    push_row(&mut out, COLUMNS.iter().map(|c| c.to_string()));
    for record in records {
        let row = vec![
            record.title.clone(),
            record.url.clone().unwrap_or_default(),
            record.timestamp.clone(),
            serde_json::to_string(&record.tags)?,
            record.summary.clone(),
            record.content.clone(),
            record.scraped_at.clone(),
            serde_json::to_string(&record.images)?,
            serde_json::to_string(&record.local_images)?,
        ];
        push_row(&mut out, row.into_iter());
    }
    Ok(out)
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push_str(&cells.map(|cell| quote(&cell)).join(","));
    out.push_str("\r\n");
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_render_csv_header_and_row() {
        let csv = render_csv(&[sample_record("Bitcoin, again", Some("https://crypto.news/a"))])
            .unwrap();
        let mut rows = csv.split("\r\n");

        assert_eq!(
            rows.next().unwrap(),
            "title,url,timestamp,tags,summary,content,scraped_at,images,local_images"
        );
        let row = rows.next().unwrap();
        assert!(row.starts_with("\"Bitcoin, again\",https://crypto.news/a,2 hours ago,"));
        assert!(row.contains(r#""[""Bitcoin"",""Markets""]""#));
        assert!(row.ends_with(",[],[]"));
    }

    #[tokio::test]
    async fn test_write_csv_skips_empty_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        assert!(!write_csv(&ScrapeOutcome::Records(vec![]), &path).await.unwrap());
        let failed = ScrapeOutcome::Failed {
            error: "x".to_string(),
        };
        assert!(!write_csv(&failed, &path).await.unwrap());
        assert!(!path.exists());

        let ok = ScrapeOutcome::Records(vec![sample_record("A", None)]);
        assert!(write_csv(&ok, &path).await.unwrap());
        assert!(path.exists());
    }
}
