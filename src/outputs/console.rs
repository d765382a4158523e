//! Human-readable console listing of a run.

use super::{HEADLINE, retrieved_at, rule};
use crate::models::ScrapeOutcome;
use itertools::Itertools;

/// Summaries longer than this are cut for display.
const SUMMARY_DISPLAY_CHARS: usize = 150;
/// Content previews longer than this are cut unless the full text is requested.
const CONTENT_PREVIEW_CHARS: usize = 500;

/// Display switches for [`render_console`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Print whole article bodies instead of a preview.
    pub full_content: bool,
    /// List image URLs and downloaded paths.
    pub show_images: bool,
}

/// Print `outcome` to stdout.
pub fn display(outcome: &ScrapeOutcome, options: DisplayOptions) {
    print!("{}", render_console(outcome, options, &retrieved_at()));
}

/// Render the console listing.
pub fn render_console(outcome: &ScrapeOutcome, options: DisplayOptions, retrieved_at: &str) -> String {
    let records = match outcome {
        ScrapeOutcome::Failed { error } => return format!("Error: {error}\n"),
        ScrapeOutcome::Records(records) => records,
    };

    let mut lines = vec![
        String::new(),
        rule(),
        HEADLINE.to_string(),
        format!("Retrieved at: {retrieved_at}"),
        rule(),
        String::new(),
    ];

    if records.is_empty() {
        lines.push("No news items found.".to_string());
        return lines.join("\n") + "\n";
    }

    for (i, record) in records.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, record.title));
        lines.push(format!("   Time: {}", record.timestamp));
        if !record.tags.is_empty() {
            lines.push(format!("   Tags: {}", record.tags.iter().join(", ")));
        }
        if !record.summary.is_empty() {
            lines.push(format!("   Summary: {}", shorten(&record.summary, SUMMARY_DISPLAY_CHARS)));
        }
        if let Some(url) = &record.url {
            lines.push(format!("   URL: {url}"));
        }

        if options.show_images && !record.images.is_empty() {
            lines.push(String::new());
            lines.push(format!("   --- IMAGES ({}) ---", record.images.len()));
            for (j, image) in record.images.iter().enumerate() {
                lines.push(format!("   {}. {}", j + 1, image.url));
                if !image.alt.trim().is_empty() {
                    lines.push(format!("      Alt: {}", image.alt));
                }
            }
        }
        if options.show_images && !record.local_images.is_empty() {
            lines.push(String::new());
            lines.push(format!("   --- DOWNLOADED IMAGES ({}) ---", record.local_images.len()));
            for (j, local) in record.local_images.iter().enumerate() {
                lines.push(format!("   {}. Saved to: {}", j + 1, local.local_path));
            }
        }

        if !record.content.is_empty() {
            lines.push(String::new());
            lines.push("   --- ARTICLE CONTENT ---".to_string());
            lines.push(format!("   {}", content_preview(&record.content, options.full_content)));
        }
        lines.push(String::new());
    }
    lines.join("\n") + "\n"
}

/// Cut `text` to `max` characters, the last three replaced by `...`.
fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

fn content_preview(content: &str, full: bool) -> String {
    if full || content.chars().count() <= CONTENT_PREVIEW_CHARS {
        content.to_string()
    } else {
        let kept: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{kept}...\n(content truncated for display)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageRef, sample_record};

    #[test]
    fn test_error_shape() {
        let failed = ScrapeOutcome::Failed {
            error: "HTTP 503 for url (https://crypto.news/)".to_string(),
        };
        assert_eq!(
            render_console(&failed, DisplayOptions::default(), "now"),
            "Error: HTTP 503 for url (https://crypto.news/)\n"
        );
    }

    #[test]
    fn test_empty_run() {
        let text = render_console(&ScrapeOutcome::Records(vec![]), DisplayOptions::default(), "now");
        assert!(text.contains("Retrieved at: now"));
        assert!(text.ends_with("No news items found.\n"));
    }

    #[test]
    fn test_summary_and_content_truncation() {
        let mut record = sample_record("A", Some("https://crypto.news/a"));
        record.summary = "s".repeat(200);
        record.content = "c".repeat(600);
        let outcome = ScrapeOutcome::Records(vec![record]);

        let short = render_console(&outcome, DisplayOptions::default(), "now");
        assert!(short.contains(&format!("   Summary: {}...\n", "s".repeat(147))));
        assert!(short.contains(&format!("   {}...\n(content truncated for display)", "c".repeat(500))));

        let full = render_console(
            &outcome,
            DisplayOptions {
                full_content: true,
                ..Default::default()
            },
            "now",
        );
        assert!(full.contains(&format!("   {}\n", "c".repeat(600))));
    }

    #[test]
    fn test_images_listed_only_when_requested() {
        let mut record = sample_record("A", None);
        record.images = vec![ImageRef::new("https://crypto.news/a.jpg", "Alt text", "")];
        let outcome = ScrapeOutcome::Records(vec![record]);

        let hidden = render_console(&outcome, DisplayOptions::default(), "now");
        assert!(!hidden.contains("IMAGES"));

        let shown = render_console(
            &outcome,
            DisplayOptions {
                show_images: true,
                ..Default::default()
            },
            "now",
        );
        assert!(shown.contains("   --- IMAGES (1) ---\n   1. https://crypto.news/a.jpg\n      Alt: Alt text\n"));
    }

    #[test]
    fn test_shorten_counts_chars() {
        assert_eq!(shorten("héllo wörld", 8), "héllo...");
        assert_eq!(shorten("short", 150), "short");
    }
}
