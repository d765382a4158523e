//! News source scrapers.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: fetch the listing page once and turn its teaser units into
//!    partially filled records ([`crypto_news::index_articles`])
//! 2. **Fetching**: visit each record's article page, extract body text and
//!    images, and optionally download the images ([`crypto_news::fetch_articles`])
//!
//! Both phases run strictly in sequence, one request at a time. A listing
//! failure aborts the run with a [`ScrapeError`]; anything that goes wrong
//! with a single article is recorded inside that article and the run goes on.

pub mod crypto_news;
pub mod download;

use crate::fetch::FetchError;
use thiserror::Error;

/// A run-fatal failure: no records can be produced.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Listing(#[from] FetchError),
}
