//! Heuristic content extraction.
//!
//! The engine works on parsed `scraper` documents and never performs I/O:
//!
//! 1. [`url`]: resolve relative links and image sources
//! 2. [`images`]: filter plausible content images out of a region
//! 3. [`locator`]: find the repeating teaser units on a listing page
//! 4. [`listing`]: recover title, URL, time, tags, summary and thumbnail from a unit
//! 5. [`body`]: isolate the main text (and images) of an article page
//!
//! Each fallback cascade is an ordered slice of strategy functions tried in
//! sequence, so precedence lives in data and every heuristic can be tested
//! on its own.

pub mod body;
pub mod images;
pub mod listing;
pub mod locator;
pub mod url;

use scraper::{ElementRef, Selector};

/// Descendants of `scope` matching `selector`, excluding `scope` itself.
pub(crate) fn select_descendants<'a>(
    scope: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let scope_id = scope.id();
    scope.select(selector).filter(move |el| el.id() != scope_id)
}

/// Concatenated text of `el`, trimmed.
pub(crate) fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Whether the lowercased `class` attribute of `el` contains any of `needles`.
pub(crate) fn class_contains(el: ElementRef<'_>, needles: &[&str]) -> bool {
    el.value()
        .attr("class")
        .map(|class| {
            let class = class.to_lowercase();
            needles.iter().any(|needle| class.contains(needle))
        })
        .unwrap_or(false)
}

/// Parse a CSS selector known at compile time.
pub(crate) fn css(selector: &'static str) -> Selector {
    match Selector::parse(selector) {
        Ok(sel) => sel,
        Err(e) => panic!("invalid built-in selector {selector:?}: {e}"),
    }
}
