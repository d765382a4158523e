//! Report writers and the console display.
//!
//! Every writer receives the whole [`ScrapeOutcome`](crate::models::ScrapeOutcome)
//! and returns `Ok(false)` without touching the filesystem when there is
//! nothing to write: always for the error shape, and (except JSON) for an
//! empty record list. `Ok(true)` means the file was written.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── crypto_news.json          # pretty-printed records
//! ├── crypto_news.csv           # one row per record
//! ├── crypto_news.txt           # numbered plain-text sections
//! └── crypto_news_report.html   # self-contained report with images
//! ```

pub mod console;
pub mod csv;
pub mod html;
pub mod json;
pub mod text;

use chrono::Local;

/// Width of the `=` rules in the console and text outputs.
pub(crate) const RULE_WIDTH: usize = 80;

/// Title line of the console and text outputs.
pub(crate) const HEADLINE: &str = "LATEST CRYPTOCURRENCY NEWS FROM CRYPTO.NEWS";

/// Local time used in report headers, `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn retrieved_at() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// An 80-column `=` rule.
pub(crate) fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}
