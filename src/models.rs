//! Data models for scraped news records and the run outcome.
//!
//! This module defines the core data structures used throughout the application:
//! - [`NewsRecord`]: One article discovered on the listing page
//! - [`ImageRef`] / [`LocalImageRef`]: Images found in a teaser or article body
//! - [`ScrapeOutcome`]: Either the ordered records of a run or a single error
//!
//! Serialized field names follow the JSON layout consumed by the report
//! writers and the page generator (`url`, `timestamp`, `content`, ...).

use serde::{Deserialize, Serialize};

/// Placeholder title used when no heading or usable link text exists.
pub const NO_TITLE: &str = "No title";

/// Placeholder timestamp used when no time-like element exists.
pub const UNKNOWN_TIME: &str = "Unknown time";

/// A single image reference discovered in a teaser or article body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageRef {
    /// Absolute image URL.
    pub url: String,
    /// The `alt` attribute, trimmed (may be empty).
    pub alt: String,
    /// The `title` attribute, trimmed (may be empty).
    pub title: String,
    /// Whether this image came from the listing teaser rather than the body.
    pub is_thumbnail: bool,
}

impl ImageRef {
    /// Build a non-thumbnail image reference.
    pub fn new(url: impl Into<String>, alt: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
            title: title.into(),
            is_thumbnail: false,
        }
    }
}

/// An image that was downloaded to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalImageRef {
    /// The remote image this file was downloaded from.
    #[serde(flatten)]
    pub image: ImageRef,
    /// Where the bytes were written.
    pub local_path: String,
}

/// One article discovered on the listing page.
///
/// Records are created once per surviving listing unit, filled in during the
/// single extraction pass (body text, images, local images) and then handed
/// to the writers unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsRecord {
    /// Teaser title, never empty ([`NO_TITLE`] when unrecoverable).
    pub title: String,
    /// Absolute article URL, if the teaser had a link.
    pub url: Option<String>,
    /// Displayed time text, never parsed ([`UNKNOWN_TIME`] when absent).
    pub timestamp: String,
    /// Category/tag link texts in document order.
    pub tags: Vec<String>,
    /// Teaser summary (may be empty).
    pub summary: String,
    /// Article body text, paragraphs separated by blank lines.
    pub content: String,
    /// Local time of extraction, `YYYY-MM-DD HH:MM:SS`.
    pub scraped_at: String,
    /// Thumbnail and body images, unique by URL.
    pub images: Vec<ImageRef>,
    /// Images successfully downloaded to disk.
    pub local_images: Vec<LocalImageRef>,
}

impl NewsRecord {
    /// Insert `thumbnail` at the front of `images` unless its URL is already present.
    pub fn merge_thumbnail(&mut self, thumbnail: ImageRef) {
        if !self.images.iter().any(|img| img.url == thumbnail.url) {
            self.images.insert(0, thumbnail);
        }
    }

    /// Images preferred for display: downloaded copies first, remote ones otherwise.
    pub fn display_images(&self) -> Vec<(&ImageRef, Option<&str>)> {
        if self.local_images.is_empty() {
            self.images.iter().map(|img| (img, None)).collect()
        } else {
            self.local_images
                .iter()
                .map(|local| (&local.image, Some(local.local_path.as_str())))
                .collect()
        }
    }
}

/// Result of one scrape run as seen by the writers.
///
/// Serialized untagged so consumers discriminate on shape: a JSON array of
/// records, or a single `{"error": "..."}` object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    /// The ordered records of a successful run (possibly empty).
    Records(Vec<NewsRecord>),
    /// The run failed before any record was produced.
    Failed { error: String },
}

impl ScrapeOutcome {
    /// The records, or `None` for the error shape.
    pub fn records(&self) -> Option<&[NewsRecord]> {
        match self {
            ScrapeOutcome::Records(records) => Some(records),
            ScrapeOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(title: &str, url: Option<&str>) -> NewsRecord {
    NewsRecord {
        title: title.to_string(),
        url: url.map(str::to_string),
        timestamp: "2 hours ago".to_string(),
        tags: vec!["Bitcoin".to_string(), "Markets".to_string()],
        summary: "Bitcoin rallied past a new high on Tuesday.".to_string(),
        content: "First paragraph.\n\nSecond paragraph.".to_string(),
        scraped_at: "2025-05-06 14:30:00".to_string(),
        images: vec![],
        local_images: vec![],
    }
}
