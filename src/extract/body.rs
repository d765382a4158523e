//! Main-text extraction for article pages.
//!
//! [`extract_body`] strips page chrome, picks the main content container with
//! an ordered cascade ([`CONTAINER_STRATEGIES`]) and rebuilds paragraph
//! text. [`fetch_article_body`] wraps it with the page fetch and turns any
//! failure into an in-band marker so a single bad article never aborts a run.

use crate::extract::images::extract_images;
use crate::extract::{css, select_descendants};
use crate::fetch::Fetch;
use crate::models::ImageRef;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

/// Body text used when no content container can be located.
pub const EXTRACTION_FAILED: &str = "Could not extract article content.";

/// Prefix of the body text used when the article could not be fetched.
pub const FETCH_FAILED_PREFIX: &str = "Error fetching article content: ";

/// A content-selector match must hold more text than this.
const MIN_SELECTOR_CHARS: usize = 200;
/// A fallback `div`/`section` must hold more text than this.
const MIN_BLOCK_CHARS: usize = 500;
/// ...and more paragraphs than this.
const MIN_BLOCK_PARAGRAPHS: usize = 3;

/// Page chrome removed from the whole document before searching.
static NOISE: Lazy<Selector> = Lazy::new(|| {
    css(r#"header, footer, nav, aside, .sidebar, .comments, .related, .share, .social, script, style, [role="banner"], [role="navigation"]"#)
});

/// Widgets removed from inside the chosen container.
static RESIDUAL_NOISE: Lazy<Selector> = Lazy::new(|| {
    css(".share, .social, .related, .recommended, .advertisements, .ad, .ads")
});

/// Content container selectors, most specific signal first.
static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        ".post-content",
        ".entry-content",
        ".article-content",
        ".content",
        ".article__body",
        ".story-body",
        ".post-body",
        ".article-body",
        ".news-content",
        r#"[itemprop="articleBody"]"#,
        r#"[property="content:encoded"]"#,
    ]
    .into_iter()
    .map(css)
    .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| css("p"));
static BLOCKS: Lazy<Selector> = Lazy::new(|| css("div, section"));

/// A heuristic that picks the main content container of a cleaned page.
pub type ContainerStrategy = for<'a> fn(&'a Html) -> Option<ElementRef<'a>>;

/// Container strategies in precedence order.
pub const CONTAINER_STRATEGIES: &[(&str, ContainerStrategy)] = &[
    ("content-selectors", by_content_selector),
    ("paragraph-dense-block", by_paragraph_density),
];

/// Extracted article text and (optionally) its images.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArticleBody {
    pub text: String,
    pub images: Vec<ImageRef>,
}

/// Extract the main text of an article page.
///
/// When `want_images` is set, images are collected from the content
/// container, or from the whole cleaned document if no container is found.
pub fn extract_body(html: &str, base: &Url, want_images: bool) -> ArticleBody {
    let mut document = Html::parse_document(html);

    let noise: Vec<_> = document.select(&NOISE).map(|el| el.id()).collect();
    debug!(removed = noise.len(), "Stripped page chrome");
    for id in noise {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let Some(container_id) = find_container(&document).map(|el| el.id()) else {
        debug!("No content container found");
        let images = if want_images {
            extract_images(document.root_element(), base)
        } else {
            Vec::new()
        };
        return ArticleBody {
            text: EXTRACTION_FAILED.to_string(),
            images,
        };
    };

    let residual: Vec<_> = document
        .tree
        .get(container_id)
        .and_then(ElementRef::wrap)
        .map(|container| {
            select_descendants(container, &RESIDUAL_NOISE)
                .map(|el| el.id())
                .collect()
        })
        .unwrap_or_default();
    for id in residual {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let Some(container) = document.tree.get(container_id).and_then(ElementRef::wrap) else {
        return ArticleBody {
            text: EXTRACTION_FAILED.to_string(),
            images: Vec::new(),
        };
    };

    let images = if want_images {
        extract_images(container, base)
    } else {
        Vec::new()
    };

    ArticleBody {
        text: container_text(container),
        images,
    }
}

/// Fetch `url` and extract its body, never failing.
///
/// Fetch errors become a `"Error fetching article content: ..."` body with
/// no images.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article_body<F: Fetch>(fetcher: &F, url: &Url, want_images: bool) -> ArticleBody {
    match fetcher.fetch_page(url).await {
        Ok(html) => {
            let body = extract_body(&html, url, want_images);
            debug!(chars = body.text.len(), images = body.images.len(), "Extracted article body");
            body
        }
        Err(e) => {
            warn!(error = %e, "Article fetch failed");
            ArticleBody {
                text: format!("{FETCH_FAILED_PREFIX}{e}"),
                images: Vec::new(),
            }
        }
    }
}

/// Run the container cascade over a cleaned document.
///
/// Strategies search from the root element so subtrees detached as noise
/// are never candidates.
pub fn find_container(document: &Html) -> Option<ElementRef<'_>> {
    CONTAINER_STRATEGIES.iter().find_map(|(name, strategy)| {
        let found = strategy(document);
        if found.is_some() {
            debug!(strategy = name, "Located content container");
        }
        found
    })
}

fn text_chars(el: ElementRef<'_>) -> usize {
    el.text().collect::<String>().trim().chars().count()
}

fn by_content_selector(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_SELECTORS.iter().find_map(|selector| {
        document
            .root_element()
            .select(selector)
            .find(|el| text_chars(*el) > MIN_SELECTOR_CHARS)
    })
}

fn by_paragraph_density(document: &Html) -> Option<ElementRef<'_>> {
    document.root_element().select(&BLOCKS).find(|el| {
        text_chars(*el) > MIN_BLOCK_CHARS
            && select_descendants(*el, &PARAGRAPH).count() > MIN_BLOCK_PARAGRAPHS
    })
}

/// Paragraph text of the container, or its whole text when it has at most one paragraph.
fn container_text(container: ElementRef<'_>) -> String {
    let paragraphs: Vec<ElementRef<'_>> = select_descendants(container, &PARAGRAPH).collect();
    if paragraphs.len() > 1 {
        paragraphs
            .into_iter()
            .map(|p| normalize_lines(&p.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        normalize_lines(&container.text().collect::<String>())
    }
}

/// Trim every line and drop blank ones.
fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
