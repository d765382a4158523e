//! Page and image retrieval.
//!
//! The extraction engine never talks to the network itself; the run driver
//! goes through the [`Fetch`] trait so the whole pipeline can be exercised
//! against in-memory pages in tests. [`HttpFetcher`] is the real
//! implementation on top of `reqwest`.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Browser-like User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Timeout applied to individual image downloads.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed fetch. Pages and images either arrive whole or not at all.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for url ({url})")]
    Status { url: String, status: u16 },
}

/// Downloaded image bytes and the server-declared content type.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Retrieval of listing pages, article pages and image bytes.
pub trait Fetch {
    /// Fetch a page as text. Non-2xx responses are errors.
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;

    /// Fetch raw image bytes. Non-2xx responses are errors.
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError>;
}

/// [`Fetch`] implementation over a shared `reqwest::Client`.
///
/// Page requests carry no timeout; image requests use [`IMAGE_TIMEOUT`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client that always sends [`BROWSER_USER_AGENT`].
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }
}

fn check_status(url: &Url, resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let body = check_status(url, resp)?.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await?;
        let resp = check_status(url, resp)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = resp.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), %content_type, "Fetched image");
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// In-memory [`Fetch`] for tests: unknown URLs answer 404.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct StaticFetcher {
    pub pages: std::collections::HashMap<String, String>,
    pub images: std::collections::HashMap<String, FetchedImage>,
    pub requests: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_image(mut self, url: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.images.insert(
            url.to_string(),
            FetchedImage {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        self
    }

    fn not_found(url: &Url) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[cfg(test)]
impl Fetch for StaticFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.pages.get(url.as_str()).cloned().ok_or_else(|| Self::not_found(url))
    }

    async fn fetch_image(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.images.get(url.as_str()).cloned().ok_or_else(|| Self::not_found(url))
    }
}
