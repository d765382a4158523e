//! Plain-text output: one numbered section per record.

use super::{HEADLINE, retrieved_at, rule};
use crate::models::{NewsRecord, ScrapeOutcome};
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write the records of `outcome` to `path`.
///
/// # Returns
///
/// `Ok(false)` for the error shape or an empty run, `Ok(true)` once written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_text(outcome: &ScrapeOutcome, path: &Path) -> Result<bool, Box<dyn Error>> {
    let Some(records) = outcome.records().filter(|r| !r.is_empty()) else {
        return Ok(false);
    };

    fs::write(path, render_text(records, &retrieved_at())).await?;
    info!(records = records.len(), "Wrote text file");
    Ok(true)
}

/// Render records as the plain-text report.
pub fn render_text(records: &[NewsRecord], retrieved_at: &str) -> String {
    let mut lines = vec![
        HEADLINE.to_string(),
        format!("Retrieved at: {retrieved_at}"),
        rule(),
        String::new(),
    ];

    for (i, record) in records.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, record.title));
        lines.push(format!("   Time: {}", record.timestamp));
        if !record.tags.is_empty() {
            lines.push(format!("   Tags: {}", record.tags.iter().join(", ")));
        }
        if let Some(url) = &record.url {
            lines.push(format!("   URL: {url}"));
        }
        if !record.summary.is_empty() {
            lines.push(format!("   Summary: {}", record.summary));
        }

        if !record.images.is_empty() {
            lines.push(String::new());
            lines.push(format!("   --- IMAGES ({}) ---", record.images.len()));
            for (j, image) in record.images.iter().enumerate() {
                lines.push(format!("   {}. {}", j + 1, image.url));
                if !image.alt.trim().is_empty() {
                    lines.push(format!("      Alt: {}", image.alt));
                }
            }
        }

        if !record.local_images.is_empty() {
            lines.push(String::new());
            lines.push(format!("   --- DOWNLOADED IMAGES ({}) ---", record.local_images.len()));
            for (j, local) in record.local_images.iter().enumerate() {
                lines.push(format!("   {}. Saved to: {}", j + 1, local.local_path));
            }
        }

        if !record.content.is_empty() {
            lines.push(String::new());
            lines.push("   --- ARTICLE CONTENT ---".to_string());
            lines.extend(record.content.split('\n').map(|line| format!("   {line}")));
        }

        lines.push(String::new());
        lines.push(rule());
        lines.push(String::new());
    }
    lines.join("\n") + "\n"
}
