//! Content image discovery.
//!
//! Given a region of a page, [`extract_images`] returns the images that look
//! like article content rather than icons, avatars or badges. Genuine `<img>`
//! elements come first, in document order, followed by inline CSS
//! `background-image` URLs.

use crate::extract::url::resolve;
use crate::extract::{class_contains, css, select_descendants};
use crate::models::ImageRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use url::Url;

/// Images narrower or shorter than this (by explicit attribute) are skipped.
const MIN_DIMENSION: u32 = 100;

/// Class fragments that mark decorative images.
const DECORATIVE_CLASSES: &[&str] = &["icon", "avatar", "logo", "thumbnail", "thumb", "badge"];

/// Source attributes in priority order, covering common lazy-loading schemes.
const SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

static IMG: Lazy<Selector> = Lazy::new(|| css("img"));
static STYLED: Lazy<Selector> = Lazy::new(|| css("[style]"));
static BACKGROUND_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"background-image\s*:\s*url\(\s*['"](.*?)['"]\s*\)"#).expect("valid regex")
});

/// One filter applied to an `<img>` candidate; `false` excludes it.
type ImageFilter = fn(ElementRef<'_>) -> bool;

/// Filters in the order they are applied; the first failure excludes.
const IMAGE_FILTERS: &[(&str, ImageFilter)] = &[
    ("min-dimensions", large_enough),
    ("decorative-class", not_decorative),
];

/// Collect plausible content images from `region`, resolving sources against `base`.
///
/// Only descendants of `region` are inspected. A resolved URL appears at
/// most once; the first occurrence wins. The function is pure.
pub fn extract_images(region: ElementRef<'_>, base: &Url) -> Vec<ImageRef> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    for img in select_descendants(region, &IMG) {
        if let Some((name, _)) = IMAGE_FILTERS.iter().find(|(_, keep)| !keep(img)) {
            tracing::trace!(filter = name, "Skipping image candidate");
            continue;
        }
        let Some(src) = image_source(img) else {
            continue;
        };
        let url = resolve(base, src);
        if !seen.insert(url.clone()) {
            continue;
        }
        let attr = |name: &str| img.value().attr(name).unwrap_or_default().trim().to_string();
        images.push(ImageRef::new(url, attr("alt"), attr("title")));
    }

    for el in select_descendants(region, &STYLED) {
        if let Some(url) = el.value().attr("style").and_then(background_image_url) {
            let url = resolve(base, url);
            if seen.insert(url.clone()) {
                images.push(ImageRef::new(url, "", ""));
            }
        }
    }

    images
}

/// First non-empty source attribute of an `<img>`, in [`SOURCE_ATTRS`] order.
fn image_source<'a>(img: ElementRef<'a>) -> Option<&'a str> {
    SOURCE_ATTRS
        .iter()
        .filter_map(|name| img.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// The first quoted `url(...)` of a `background-image` declaration.
fn background_image_url(style: &str) -> Option<&str> {
    if !style.contains("background-image") {
        return None;
    }
    BACKGROUND_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
}

fn large_enough(img: ElementRef<'_>) -> bool {
    ["width", "height"].iter().all(|name| {
        img.value()
            .attr(name)
            .and_then(leading_number)
            .is_none_or(|n| n >= MIN_DIMENSION)
    })
}

fn not_decorative(img: ElementRef<'_>) -> bool {
    !class_contains(img, DECORATIVE_CLASSES)
}

/// Leading decimal integer of an attribute value (`"80px"` -> 80).
fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
