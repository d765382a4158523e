//! Styled per-article HTML pages written by a text model.
//!
//! The model is asked for a complete HTML document that references article
//! images as `src="image1"`, `src="image2"`, ... Those placeholders are then
//! swapped for the remote URL, or for a base64 data URI when the image was
//! downloaded, so each page is self-contained.

use super::{GenerateAsync, GenerateRequest};
use crate::models::NewsRecord;
use crate::utils::{ensure_writable_dir, safe_file_stem, truncate_for_log};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Generated page names keep at most this many characters of the title.
const MAX_STEM_CHARS: usize = 50;

static IMAGE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"src=["']\s*image(\d+)[^"']*["']"#).expect("valid regex")
});

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").expect("valid regex")
});

/// Where an image referenced by a page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A downloaded file that exists on disk.
    Local(PathBuf),
    /// A remote URL.
    Online(String),
}

/// One image as described to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptImage {
    /// 1-based; the page refers to it as `image<index>`.
    pub index: usize,
    pub source: ImageSource,
    pub alt: String,
    pub is_thumbnail: bool,
}

/// The images to offer the model: downloaded copies when there are any,
/// remote images otherwise.
pub fn prompt_images(record: &NewsRecord) -> Vec<PromptImage> {
    record
        .display_images()
        .into_iter()
        .enumerate()
        .map(|(i, (image, local_path))| {
            let source = match local_path.map(Path::new) {
                Some(path) if path.exists() => ImageSource::Local(path.to_path_buf()),
                _ => ImageSource::Online(image.url.clone()),
            };
            PromptImage {
                index: i + 1,
                source,
                alt: image.alt.clone(),
                is_thumbnail: image.is_thumbnail,
            }
        })
        .collect()
}

/// Build the page-design prompt for `record`.
pub fn page_prompt(record: &NewsRecord, images: &[PromptImage]) -> String {
    let mut images_description = String::from("No images available.");
    if !images.is_empty() {
        images_description = String::from("\nImages:\n");
        for image in images {
            let thumbnail = if image.is_thumbnail { "Yes" } else { "No" };
            let location = match &image.source {
                ImageSource::Online(url) => format!("URL: {url}"),
                ImageSource::Local(_) => "Local Image".to_string(),
            };
            images_description.push_str(&format!(
                "- Image {i}: Reference: 'image{i}', {location}, Alt: {alt}, Is Thumbnail: {thumbnail}\n",
                i = image.index,
                alt = image.alt,
            ));
        }
    }

    format!(
        r#"Create a beautiful, professional HTML document for this article with the following characteristics:

1. Use modern HTML5 standards with appropriate semantic tags
2. Create an exceptionally attractive visual design with:
   - A modern, premium magazine-style layout
   - Beautiful typography using web-safe or Google Fonts
   - Professional color scheme with complementary colors
   - Subtle animations for hover states and transitions
   - Visual hierarchy to highlight important information
   - Proper spacing and padding for readability
   - Responsive design that works on mobile and desktop
   - Card-based design elements where appropriate
   - Attractive blockquote styling for quotes
   - Visual separation between sections
   - Subtle background patterns or gradients
3. Include social media sharing buttons
4. Add a professional header with logo placeholder
5. Add a footer with copyright information
6. Ensure excellent readability with proper line heights and font sizes
7. Include appropriate icons (using Font Awesome or Material icons)
8. Include the article images in the appropriate locations:
   - Place the thumbnail image (if available) at the top of the article
   - Distribute other images throughout the content where they fit contextually
   - Use responsive image techniques
   - Apply attractive styling to images (subtle shadows, borders, etc.)

ARTICLE DATA:
Title: {title}
URL: {url}
Timestamp: {timestamp}
Content:
{content}

{images_description}

IMPORTANT: For images, use placeholder references in the src attribute. For example: src="image1" for the first image, src="image2" for the second, etc.

Return only the complete HTML code without any additional text or explanations.
The CSS should be included in the <head> section of the document.
"#,
        title = record.title,
        url = record.url.as_deref().unwrap_or("None"),
        timestamp = record.timestamp,
        content = record.content,
    )
}

/// Remove a Markdown code fence wrapped around the whole response.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Replace `src="imageN"` placeholders with real sources.
///
/// `resolve` receives each image and returns the `src` value to use, or
/// `None` to leave that placeholder untouched. Placeholders with no
/// matching image are left as they are.
pub fn replace_placeholders<F>(html: &str, images: &[PromptImage], mut resolve: F) -> String
where
    F: FnMut(&PromptImage) -> Option<String>,
{
    IMAGE_PLACEHOLDER
        .replace_all(html, |caps: &Captures<'_>| {
            let index: Option<usize> = caps[1].parse().ok();
            index
                .and_then(|n| images.iter().find(|img| img.index == n))
                .and_then(&mut resolve)
                .map(|src| format!(r#"src="{src}""#))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Mime type for a local image, guessed from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// A `data:` URI holding `bytes`.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// The `src` value for one image: its URL, or the inlined local file.
fn image_src(image: &PromptImage) -> Option<String> {
    match &image.source {
        ImageSource::Online(url) => Some(url.clone()),
        ImageSource::Local(path) => match std::fs::read(path) {
            Ok(bytes) => Some(data_uri(mime_for_path(path), &bytes)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error encoding image");
                None
            }
        },
    }
}

/// Ask `model` for a page for `record` and return the finished HTML.
#[instrument(level = "info", skip_all, fields(title = %record.title))]
pub async fn generate_page<G: GenerateAsync>(
    model: &G,
    record: &NewsRecord,
) -> Result<String, Box<dyn Error>> {
    let images = prompt_images(record);
    let prompt = page_prompt(record, &images);
    let generated = model.generate(&GenerateRequest::text(prompt)).await?;
    let text = generated.text();
    debug!(response = %truncate_for_log(&text, 200), "Model response");

    let html = strip_code_fence(&text);
    Ok(replace_placeholders(html, &images, image_src))
}

/// Generate one page per record into `pages_dir`.
///
/// Failures are logged per record and skipped. Returns the written paths.
#[instrument(level = "info", skip_all, fields(pages_dir = %pages_dir.display(), count = records.len()))]
pub async fn generate_pages<G: GenerateAsync>(
    model: &G,
    records: &[NewsRecord],
    pages_dir: &Path,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    ensure_writable_dir(pages_dir).await?;

    let mut written = Vec::new();
    for (i, record) in records.iter().enumerate() {
        info!(progress = %format!("{}/{}", i + 1, records.len()), title = %record.title, "Generating HTML page");
        let html = match generate_page(model, record).await {
            Ok(html) => html,
            Err(e) => {
                warn!(title = %record.title, error = %e, "Page generation failed; skipping");
                continue;
            }
        };
        let path = pages_dir.join(format!("{}.html", safe_file_stem(&record.title, MAX_STEM_CHARS)));
        match fs::write(&path, html).await {
            Ok(()) => {
                info!(path = %path.display(), "HTML content saved");
                written.push(path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Could not write page"),
        }
    }
    Ok(written)
}
