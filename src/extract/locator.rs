//! Listing-page unit discovery.
//!
//! A "unit" is a subtree believed to hold one article teaser. Units are found
//! with an ordered cascade of structural strategies ([`STRATEGIES`]); the
//! first strategy that yields at least one unit wins and later ones are not
//! consulted.

use crate::extract::{class_contains, css, select_descendants, trimmed_text};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// A unit-finding heuristic over a whole listing document.
pub type UnitStrategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// Unit strategies in precedence order.
pub const STRATEGIES: &[(&str, UnitStrategy)] = &[
    ("latest-section", latest_section),
    ("article-elements", article_elements),
    ("class-hinted-blocks", class_hinted_blocks),
    ("story-containers", story_containers),
];

const BLOCK_CLASS_HINTS: &[&str] = &["news", "post", "article", "item", "story"];
const STORY_CLASS_HINTS: &[&str] = &["stories"];

static HEADINGS: Lazy<Selector> = Lazy::new(|| css("h1, h2, h3, h4, h5, h6"));
static VISIBLE_HEADINGS: Lazy<Selector> = Lazy::new(|| css("h1, h2, h3"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| css("article"));
static LINK: Lazy<Selector> = Lazy::new(|| css("a"));
static BLOCKS: Lazy<Selector> = Lazy::new(|| css("div, li"));
static STORY_CONTAINERS: Lazy<Selector> = Lazy::new(|| css("div, section"));
static STORY_ITEMS: Lazy<Selector> = Lazy::new(|| css("div, li, article"));
static TEASER_HEADINGS: Lazy<Selector> = Lazy::new(|| css("h2, h3, h4"));

/// Find the teaser units of a listing page.
///
/// Returns an empty vector (after logging the page's visible headings as a
/// debugging aid) when no strategy matches; this is not an error.
pub fn locate_units(document: &Html) -> Vec<ElementRef<'_>> {
    for (name, strategy) in STRATEGIES {
        let units = strategy(document);
        if !units.is_empty() {
            debug!(strategy = name, count = units.len(), "Located article units");
            return units;
        }
        debug!(strategy = name, "Unit strategy found nothing");
    }

    let headings: Vec<String> = document
        .select(&VISIBLE_HEADINGS)
        .map(trimmed_text)
        .filter(|text| !text.is_empty())
        .collect();
    warn!(?headings, "Could not find article elements on the page");
    Vec::new()
}

/// The `article` children of the element right after a "Latest" heading.
fn latest_section(document: &Html) -> Vec<ElementRef<'_>> {
    let Some(heading) = document
        .select(&HEADINGS)
        .find(|h| trimmed_text(*h).contains("Latest"))
    else {
        return Vec::new();
    };
    let Some(container) = heading.next_siblings().find_map(ElementRef::wrap) else {
        return Vec::new();
    };
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "article")
        .collect()
}

/// Every `article` element in the document.
fn article_elements(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&ARTICLE).collect()
}

/// `div`/`li` blocks with a news-like class that hold a link and some content.
fn class_hinted_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&BLOCKS)
        .filter(|el| class_contains(*el, BLOCK_CLASS_HINTS))
        .filter(|el| has_link(*el))
        .filter(|el| {
            select_descendants(*el, &TEASER_HEADINGS).next().is_some()
                || !trimmed_text(*el).is_empty()
        })
        .collect()
}

/// Link-bearing items inside "stories" containers, plus "Read more" link parents.
fn story_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let mut units = Vec::new();

    for container in document
        .select(&STORY_CONTAINERS)
        .filter(|el| class_contains(*el, STORY_CLASS_HINTS))
    {
        for item in select_descendants(container, &STORY_ITEMS).filter(|el| has_link(*el)) {
            push_unique(&mut units, item);
        }
    }

    for link in document
        .select(&LINK)
        .filter(|a| a.text().collect::<String>().contains("Read more"))
    {
        let parent = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| matches!(el.value().name(), "div" | "article" | "li"));
        if let Some(parent) = parent {
            push_unique(&mut units, parent);
        }
    }

    units
}

fn push_unique<'a>(units: &mut Vec<ElementRef<'a>>, el: ElementRef<'a>) {
    if !units.iter().any(|u| u.id() == el.id()) {
        units.push(el);
    }
}

fn has_link(el: ElementRef<'_>) -> bool {
    select_descendants(el, &LINK).next().is_some()
}
