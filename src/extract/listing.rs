//! Field extraction for a single listing teaser.
//!
//! [`extract_listing_item`] turns one unit found by the locator into a
//! partially filled [`NewsRecord`] plus an optional thumbnail. Title,
//! timestamp and summary each come from an ordered slice of strategies; the
//! first strategy returning `Some` wins.

use crate::extract::url::resolve;
use crate::extract::{class_contains, css, select_descendants, trimmed_text};
use crate::models::{ImageRef, NO_TITLE, NewsRecord, UNKNOWN_TIME};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use url::Url;

/// Filenames that mark a lazy-loading placeholder or spacer image.
const PLACEHOLDER_IMAGES: &[&str] = &["lazy-placeholder.png", "blank.gif"];
/// The placeholder that is swapped for `data-src` when present.
const LAZY_PLACEHOLDER: &str = "lazy-placeholder.png";

const TITLE_LINK_CLASSES: &[&str] = &["title", "heading"];
const TAG_LINK_CLASSES: &[&str] = &["category", "tag", "topic"];
const SUMMARY_DIV_CLASSES: &[&str] = &["summary", "excerpt", "content"];
const TIME_KEYWORDS: &[&str] = &["ago", "hour", "minute", "second", "day", "week"];

/// Texts must be longer than this to count as a title or summary.
const MIN_TEXT_CHARS: usize = 10;
/// Relative-time texts must be shorter than this.
const MAX_TIME_CHARS: usize = 20;
/// Tag link texts must be shorter than this.
const MAX_TAG_CHARS: usize = 30;

static IMG: Lazy<Selector> = Lazy::new(|| css("img"));
static LINK: Lazy<Selector> = Lazy::new(|| css("a"));
static LINK_WITH_HREF: Lazy<Selector> = Lazy::new(|| css("a[href]"));
static TEASER_HEADING: Lazy<Selector> = Lazy::new(|| css("h2, h3, h4"));
static TIME: Lazy<Selector> = Lazy::new(|| css("time"));
static DATETIME_ATTR: Lazy<Selector> = Lazy::new(|| css("[datetime]"));
static TIME_CANDIDATES: Lazy<Selector> = Lazy::new(|| css("span, div, p"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| css("p"));
static DIV: Lazy<Selector> = Lazy::new(|| css("div"));

/// A field heuristic over one unit.
pub type FieldStrategy = fn(ElementRef<'_>) -> Option<String>;

/// A summary heuristic; receives the already-detected timestamp text.
pub type SummaryStrategy = fn(ElementRef<'_>, &str) -> Option<String>;

/// Title strategies in precedence order; [`NO_TITLE`] when all fail.
pub const TITLE_STRATEGIES: &[FieldStrategy] = &[heading_title, classed_link_title, long_link_title];

/// Timestamp strategies in precedence order; [`UNKNOWN_TIME`] when all fail.
pub const TIMESTAMP_STRATEGIES: &[FieldStrategy] = &[time_element, datetime_attr, relative_time_text];

/// Summary strategies in precedence order; empty when all fail.
pub const SUMMARY_STRATEGIES: &[SummaryStrategy] = &[first_paragraph_summary, classed_div_summary];

/// Everything recoverable from one listing unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem {
    /// Record with listing fields filled in; body and images still empty.
    pub record: NewsRecord,
    /// The teaser image, if one survived placeholder filtering.
    pub thumbnail: Option<ImageRef>,
}

/// Extract the listing fields of `unit`.
///
/// Returns `None` when the unit's canonical URL is already in `seen`, which
/// drops duplicate teasers (first occurrence wins). Newly seen URLs are
/// added to `seen`. Units without a link are never treated as duplicates.
pub fn extract_listing_item(
    unit: ElementRef<'_>,
    base: &Url,
    seen: &mut HashSet<String>,
) -> Option<ListingItem> {
    let thumbnail = thumbnail(unit, base);

    let url = canonical_url(unit, base);
    if let Some(url) = &url {
        if !seen.insert(url.clone()) {
            tracing::debug!(%url, "Skipping duplicate listing unit");
            return None;
        }
    }

    let title = first_match(TITLE_STRATEGIES, unit).unwrap_or_else(|| NO_TITLE.to_string());
    let timestamp =
        first_match(TIMESTAMP_STRATEGIES, unit).unwrap_or_else(|| UNKNOWN_TIME.to_string());
    let summary = SUMMARY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(unit, &timestamp))
        .unwrap_or_default();

    Some(ListingItem {
        record: NewsRecord {
            title,
            url,
            timestamp,
            tags: tags(unit),
            summary,
            content: String::new(),
            scraped_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            images: Vec::new(),
            local_images: Vec::new(),
        },
        thumbnail,
    })
}

fn first_match(strategies: &[FieldStrategy], unit: ElementRef<'_>) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(unit))
}

/// The first link's `href`, resolved.
pub fn canonical_url(unit: ElementRef<'_>, base: &Url) -> Option<String> {
    select_descendants(unit, &LINK_WITH_HREF)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| resolve(base, href))
}

/// The first `<img>` of the unit, unless it is only a placeholder.
pub fn thumbnail(unit: ElementRef<'_>, base: &Url) -> Option<ImageRef> {
    let img = select_descendants(unit, &IMG).next()?;
    let attrs = img.value();

    let mut src = attrs.attr("src").map(str::trim).unwrap_or_default();
    if src.is_empty() || src.ends_with(LAZY_PLACEHOLDER) {
        if let Some(data_src) = attrs.attr("data-src").map(str::trim) {
            src = data_src;
        }
    }
    if src.is_empty() || PLACEHOLDER_IMAGES.iter().any(|p| src.ends_with(p)) {
        return None;
    }

    Some(ImageRef {
        url: resolve(base, src),
        alt: attrs.attr("alt").unwrap_or_default().trim().to_string(),
        title: attrs.attr("title").unwrap_or_default().trim().to_string(),
        is_thumbnail: true,
    })
}

/// Category/tag/topic link texts, in document order, duplicates kept.
pub fn tags(unit: ElementRef<'_>) -> Vec<String> {
    select_descendants(unit, &LINK)
        .filter(|a| class_contains(*a, TAG_LINK_CLASSES))
        .map(trimmed_text)
        .filter(|tag| !tag.is_empty() && tag.chars().count() < MAX_TAG_CHARS)
        .collect()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn longer_than_min(text: String) -> Option<String> {
    (text.chars().count() > MIN_TEXT_CHARS).then_some(text)
}

fn heading_title(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &TEASER_HEADING)
        .next()
        .map(trimmed_text)
        .and_then(non_empty)
}

fn classed_link_title(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &LINK)
        .find(|a| class_contains(*a, TITLE_LINK_CLASSES))
        .map(trimmed_text)
        .and_then(non_empty)
}

fn long_link_title(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &LINK)
        .next()
        .map(trimmed_text)
        .and_then(longer_than_min)
}

fn time_element(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &TIME)
        .next()
        .map(trimmed_text)
        .and_then(non_empty)
}

fn datetime_attr(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &DATETIME_ATTR)
        .next()
        .map(trimmed_text)
        .and_then(non_empty)
}

fn relative_time_text(unit: ElementRef<'_>) -> Option<String> {
    select_descendants(unit, &TIME_CANDIDATES)
        .map(trimmed_text)
        .find(|text| {
            let lower = text.to_lowercase();
            text.chars().count() < MAX_TIME_CHARS
                && TIME_KEYWORDS.iter().any(|word| lower.contains(word))
        })
}

/// Whether either string contains the other, ignoring case.
fn overlaps(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    a.contains(&b) || b.contains(&a)
}

fn first_paragraph_summary(unit: ElementRef<'_>, timestamp: &str) -> Option<String> {
    select_descendants(unit, &PARAGRAPH)
        .next()
        .map(trimmed_text)
        .and_then(longer_than_min)
        .filter(|text| !overlaps(text, timestamp))
}

fn classed_div_summary(unit: ElementRef<'_>, timestamp: &str) -> Option<String> {
    select_descendants(unit, &DIV)
        .find(|div| class_contains(*div, SUMMARY_DIV_CLASSES))
        .map(trimmed_text)
        .and_then(longer_than_min)
        .filter(|text| !overlaps(text, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn base() -> Url {
        Url::parse("https://crypto.news/").unwrap()
    }

    fn with_unit<T>(html: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let doc = Html::parse_document(&format!("<html><body>{html}</body></html>"));
        let unit = doc.select(&css("article, .unit")).next().unwrap();
        f(unit)
    }

    fn listing_item(html: &str) -> ListingItem {
        with_unit(html, |unit| {
            extract_listing_item(unit, &base(), &mut HashSet::new()).unwrap()
        })
    }

    #[test]
    fn test_minimal_listing_unit() {
        let item = listing_item(
            r#"<article><h2>Foo</h2><a href="/bar">link</a>
               <p>Hello world, this is a summary over ten chars.</p></article>"#,
        );
        assert_eq!(item.record.title, "Foo");
        assert_eq!(item.record.url.as_deref(), Some("https://crypto.news/bar"));
        assert_eq!(item.record.summary, "Hello world, this is a summary over ten chars.");
        assert_eq!(item.record.timestamp, UNKNOWN_TIME);
        assert!(item.record.tags.is_empty());
        assert!(item.thumbnail.is_none());
        assert!(item.record.images.is_empty());
    }

    #[test]
    fn test_duplicate_url_is_skipped() {
        let doc = Html::parse_document(
            r#"<article><a href="/same">First one here</a></article>
               <article><a href="https://crypto.news/same">Second one</a></article>"#,
        );
        let mut seen = HashSet::new();
        let units: Vec<_> = doc.select(&css("article")).collect();
        assert!(extract_listing_item(units[0], &base(), &mut seen).is_some());
        assert!(extract_listing_item(units[1], &base(), &mut seen).is_none());
        assert!(seen.contains("https://crypto.news/same"));
    }

    #[test]
    fn test_units_without_links_are_never_duplicates() {
        let doc = Html::parse_document("<article><h3>A</h3></article><article><h3>B</h3></article>");
        let mut seen = HashSet::new();
        let kept = doc
            .select(&css("article"))
            .filter_map(|unit| extract_listing_item(unit, &base(), &mut seen))
            .count();
        assert_eq!(kept, 2);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_title_fallbacks() {
        let title = |html: &str| with_unit(html, |u| first_match(TITLE_STRATEGIES, u));
        assert_eq!(
            title(r#"<article><a href="/x">short</a><a class="Card-Title" href="/y">Classed</a></article>"#),
            Some("Classed".to_string())
        );
        assert_eq!(
            title(r#"<article><a href="/x">A long enough link text</a></article>"#),
            Some("A long enough link text".to_string())
        );
        assert_eq!(title(r#"<article><a href="/x">too short</a></article>"#), None);
        assert_eq!(listing_item(r#"<article><a href="/x">too short</a></article>"#).record.title, NO_TITLE);
    }

    #[test]
    fn test_empty_heading_falls_through() {
        let item = listing_item(r#"<article><h3> </h3><a href="/x">Fallback link title</a></article>"#);
        assert_eq!(item.record.title, "Fallback link title");
    }

    #[test]
    fn test_timestamp_from_time_or_datetime() {
        let ts = |html: &str| with_unit(html, |u| first_match(TIMESTAMP_STRATEGIES, u));
        assert_eq!(
            ts(r#"<article><time datetime="2025-05-06">May 6</time></article>"#),
            Some("May 6".to_string())
        );
        assert_eq!(
            ts(r#"<article><span data-x="1" datetime="x">Yesterday</span></article>"#),
            Some("Yesterday".to_string())
        );
        assert_eq!(
            ts(r#"<article><div>Some long body text mentioning a day</div><span>3 hours ago</span></article>"#),
            Some("3 hours ago".to_string())
        );
        assert_eq!(ts(r#"<article><span>Bitcoin</span></article>"#), None);
    }

    #[test]
    fn test_time_element_wins_over_earlier_datetime_attr() {
        let ts = |html: &str| with_unit(html, |u| first_match(TIMESTAMP_STRATEGIES, u));
        assert_eq!(
            ts(r#"<article><span datetime="2025-05-05">Updated</span><time>May 6</time></article>"#),
            Some("May 6".to_string())
        );
        assert_eq!(
            ts(r#"<article><time> </time><span datetime="2025-05-05">Updated</span></article>"#),
            Some("Updated".to_string())
        );
    }

    #[test]
    fn test_summary_equal_to_timestamp_is_dropped() {
        let item = listing_item(r#"<article><h2>T</h2><a href="/t">x</a><p>15 minutes ago</p></article>"#);
        assert_eq!(item.record.timestamp, "15 minutes ago");
        assert_eq!(item.record.summary, "");
    }

    #[test]
    fn test_classed_div_equal_to_timestamp_is_dropped() {
        let item = listing_item(
            r#"<article><h3>Title here</h3><a href="/x">x</a><div class="post-content">15 minutes ago</div></article>"#,
        );
        assert_eq!(item.record.timestamp, "15 minutes ago");
        assert_ne!(item.record.summary, item.record.timestamp);
        assert_eq!(item.record.summary, "");
    }

    #[test]
    fn test_summary_falls_back_to_classed_div() {
        let item = listing_item(
            r#"<article><h2>T</h2><p>short</p>
               <div class="post-excerpt">An excerpt that is long enough.</div></article>"#,
        );
        assert_eq!(item.record.summary, "An excerpt that is long enough.");
    }

    #[test]
    fn test_tags_keep_order_and_duplicates() {
        let item = listing_item(
            r#"<article><h2>T</h2>
               <a class="tag" href="/t/btc">Bitcoin</a>
               <a class="post-category" href="/c/m">Markets</a>
               <a class="Topic" href="/t/btc">Bitcoin</a>
               <a class="tag" href="/t/long">This tag text is far too long to be a tag</a>
               <a class="tag" href="/t/empty"> </a></article>"#,
        );
        assert_eq!(item.record.tags, ["Bitcoin", "Markets", "Bitcoin"]);
    }

    #[test]
    fn test_lazy_thumbnail_uses_data_src() {
        let item = listing_item(
            r#"<article><img src="lazy-placeholder.png" data-src="/real.jpg" alt="Chart">
               <a href="/a">An article title here</a></article>"#,
        );
        let thumb = item.thumbnail.unwrap();
        assert_eq!(thumb.url, "https://crypto.news/real.jpg");
        assert_eq!(thumb.alt, "Chart");
        assert!(thumb.is_thumbnail);
    }

    #[test]
    fn test_placeholder_thumbnail_is_skipped() {
        let item = listing_item(r#"<article><img src="/img/blank.gif"><a href="/a">x</a></article>"#);
        assert!(item.thumbnail.is_none());

        let item = listing_item(r#"<article><img src="/lazy-placeholder.png"><a href="/a">x</a></article>"#);
        assert!(item.thumbnail.is_none());
    }

    #[test]
    fn test_overlaps_is_case_insensitive_both_ways() {
        assert!(overlaps("2 Hours Ago", "2 hours ago"));
        assert!(overlaps("Posted 2 hours ago by staff", "2 HOURS AGO"));
        assert!(overlaps("ago", "2 hours ago"));
        assert!(!overlaps("Bitcoin climbs", "Unknown time"));
    }
}
