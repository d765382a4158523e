//! crypto.news listing scraper.
//!
//! Scrapes the [crypto.news](https://crypto.news/) homepage (or any page with
//! a similar teaser layout given via `--base-url`). Teasers are located with
//! the heuristic cascade in [`crate::extract::locator`]; article pages are
//! reduced to their main text by [`crate::extract::body`].

use super::ScrapeError;
use super::download::{download_image, image_file_name};
use crate::extract::body::fetch_article_body;
use crate::extract::listing::{ListingItem, extract_listing_item};
use crate::extract::locator::locate_units;
use crate::fetch::Fetch;
use crate::models::NewsRecord;
use scraper::Html;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Listing page scraped when no other base URL is given.
pub const DEFAULT_BASE_URL: &str = "https://crypto.news/";

/// What a run should collect.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Listing page; also the base for resolving teaser links.
    pub base_url: Url,
    /// Maximum number of records, `0` for unlimited.
    pub limit: usize,
    /// Whether to fetch each article page for its body text.
    pub fetch_content: bool,
    /// Whether to collect thumbnail and body images.
    pub extract_images: bool,
    /// Whether to download collected images (implies `extract_images`).
    pub download_images: bool,
    /// Root folder for downloaded images.
    pub images_folder: PathBuf,
}

impl ScrapeOptions {
    /// Options with defaults for everything but the listing URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(base_url).map_err(|source| ScrapeError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url,
            limit: 5,
            fetch_content: true,
            extract_images: false,
            download_images: false,
            images_folder: PathBuf::from("crypto_news_images"),
        })
    }

    fn wants_images(&self) -> bool {
        self.extract_images || self.download_images
    }
}

/// Scrape the listing page and every surviving article, in discovery order.
///
/// # Errors
///
/// Returns [`ScrapeError`] only when the listing page itself cannot be
/// fetched. Zero located units is a successful, empty run.
#[instrument(level = "info", skip_all, fields(base_url = %options.base_url, limit = options.limit))]
pub async fn scrape_latest<F: Fetch>(
    fetcher: &F,
    options: &ScrapeOptions,
) -> Result<Vec<NewsRecord>, ScrapeError> {
    let items = index_articles(fetcher, &options.base_url, options.limit).await?;
    Ok(fetch_articles(fetcher, items, options).await)
}

/// Fetch the listing page and extract one [`ListingItem`] per surviving unit.
///
/// Duplicate teasers (same canonical URL) are dropped, first occurrence
/// wins. The limit counts surviving items and is applied after the unit
/// cascade has run.
#[instrument(level = "info", skip_all, fields(%base_url))]
pub async fn index_articles<F: Fetch>(
    fetcher: &F,
    base_url: &Url,
    limit: usize,
) -> Result<Vec<ListingItem>, ScrapeError> {
    let html = fetcher.fetch_page(base_url).await?;
    let items = index_listing_page(&html, base_url, limit);
    info!(count = items.len(), source = %base_url, "Indexed listing page");
    Ok(items)
}

/// The synchronous part of [`index_articles`], over an already-fetched page.
pub fn index_listing_page(html: &str, base_url: &Url, limit: usize) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let units = locate_units(&document);
    debug!(units = units.len(), "Found potential news items");

    let limit = if limit == 0 { usize::MAX } else { limit };
    let mut seen = HashSet::new();
    units
        .into_iter()
        .filter_map(|unit| extract_listing_item(unit, base_url, &mut seen))
        .take(limit)
        .collect()
}

/// Complete each listing item: body text, images, downloads.
///
/// Articles are processed one at a time. Failures stay inside the affected
/// record (marker body text, omitted image) and never abort the batch.
#[instrument(level = "info", skip_all, fields(count = items.len()))]
pub async fn fetch_articles<F: Fetch>(
    fetcher: &F,
    items: Vec<ListingItem>,
    options: &ScrapeOptions,
) -> Vec<NewsRecord> {
    let total = items.len();
    let mut records = Vec::with_capacity(total);

    for (i, item) in items.into_iter().enumerate() {
        let ListingItem {
            mut record,
            thumbnail,
        } = item;

        if options.fetch_content {
            match record.url.as_deref().map(Url::parse) {
                Some(Ok(url)) => {
                    info!(progress = %format!("[{}/{}]", i + 1, total), title = %record.title, "Fetching content");
                    let body = fetch_article_body(fetcher, &url, options.wants_images()).await;
                    record.content = body.text;
                    record.images = body.images;
                }
                Some(Err(e)) => {
                    warn!(index = i, url = ?record.url, error = %e, "Article URL is not absolute; skipping content");
                }
                None => debug!(index = i, "Listing item has no link; skipping content"),
            }
        }

        if let Some(thumbnail) = thumbnail.filter(|_| options.wants_images()) {
            record.merge_thumbnail(thumbnail);
        }

        if options.download_images && !record.images.is_empty() {
            let folder = options.images_folder.join(format!("article_{}", i + 1));
            info!(count = record.images.len(), title = %record.title, "Downloading images");
            for (j, image) in record.images.iter().enumerate() {
                let file_name = image_file_name(j + 1, &image.url);
                if let Some(local) = download_image(fetcher, image, &folder, &file_name).await {
                    record.local_images.push(local);
                }
            }
        }

        records.push(record);
    }

    info!(count = records.len(), "Successfully scraped news articles");
    records
}
