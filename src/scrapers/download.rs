//! Image downloads into a per-article folder.

use crate::fetch::Fetch;
use crate::models::{ImageRef, LocalImageRef};
use rand::{Rng, rng};
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument, warn};
use url::Url;

/// Download `image` into `folder/file_name`.
///
/// Accepts the response only when its content type starts with `image/`.
/// Every failure is logged and yields `None`; callers simply omit the entry.
#[instrument(level = "debug", skip_all, fields(url = %image.url, %file_name))]
pub async fn download_image<F: Fetch>(
    fetcher: &F,
    image: &ImageRef,
    folder: &Path,
    file_name: &str,
) -> Option<LocalImageRef> {
    let url = match Url::parse(&image.url) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "Image URL is not absolute; skipping download");
            return None;
        }
    };

    let fetched = match fetcher.fetch_image(&url).await {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!(error = %e, "Error downloading image");
            return None;
        }
    };

    if !fetched.content_type.starts_with("image/") {
        warn!(content_type = %fetched.content_type, "URL does not point to an image");
        return None;
    }

    if let Err(e) = fs::create_dir_all(folder).await {
        warn!(folder = %folder.display(), error = %e, "Could not create image folder");
        return None;
    }

    let path = folder.join(file_name);
    if let Err(e) = fs::write(&path, &fetched.bytes).await {
        warn!(path = %path.display(), error = %e, "Could not write image");
        return None;
    }

    debug!(path = %path.display(), bytes = fetched.bytes.len(), "Downloaded image");
    Some(LocalImageRef {
        image: image.clone(),
        local_path: path.to_string_lossy().into_owned(),
    })
}

/// File name for the `index`-th (1-based) image of an article.
///
/// Uses the percent-decoded last path segment of `url`. When the URL has no
/// usable basename a random `image_<index>_<n>.jpg` name is generated.
pub fn image_file_name(index: usize, url: &str) -> String {
    match basename(url) {
        Some(name) => format!("image_{index}_{name}"),
        None => {
            let suffix: u32 = rng().random_range(0..1_000_000);
            format!("image_{index}_{suffix}.jpg")
        }
    }
}

fn basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    let name: String = decoded
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let name = name.trim();
    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    #[test]
    fn test_file_name_uses_basename() {
        assert_eq!(
            image_file_name(2, "https://crypto.news/img/2025/05/chart.png?w=800"),
            "image_2_chart.png"
        );
    }

    #[test]
    fn test_file_name_decodes_and_sanitizes() {
        assert_eq!(
            image_file_name(1, "https://crypto.news/img/btc%20price.jpg"),
            "image_1_btc price.jpg"
        );
        assert_eq!(
            image_file_name(1, "https://crypto.news/img/a%2Fb.jpg"),
            "image_1_a_b.jpg"
        );
    }

    #[test]
    fn test_file_name_fallback() {
        for url in ["https://crypto.news/", "not a url"] {
            let name = image_file_name(3, url);
            assert!(name.starts_with("image_3_"), "{name}");
            assert!(name.ends_with(".jpg"), "{name}");
        }
    }

    #[tokio::test]
    async fn test_download_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("article_1");
        let fetcher =
            StaticFetcher::default().with_image("https://x.test/a.png", "image/png", b"\x89PNG");
        let image = ImageRef::new("https://x.test/a.png", "A", "");

        let local = download_image(&fetcher, &image, &folder, "image_1_a.png")
            .await
            .unwrap();

        assert_eq!(local.image, image);
        assert_eq!(std::fs::read(folder.join("image_1_a.png")).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_download_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher =
            StaticFetcher::default().with_image("https://x.test/a.png", "text/html", b"<html>");
        let image = ImageRef::new("https://x.test/a.png", "", "");

        let local = download_image(&fetcher, &image, dir.path(), "a.png").await;

        assert!(local.is_none());
        assert!(!dir.path().join("a.png").exists());
    }

    #[tokio::test]
    async fn test_download_failure_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let image = ImageRef::new("https://x.test/missing.png", "", "");
        let local = download_image(&StaticFetcher::default(), &image, dir.path(), "m.png").await;
        assert!(local.is_none());
    }
}
