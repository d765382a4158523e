//! Command-line interface definitions for crypto_news.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Gemini settings can also be provided via environment variables.

use crate::genai::gemini::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::scrapers::crypto_news::DEFAULT_BASE_URL;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Scrape the latest cryptocurrency news from crypto.news.
///
/// # Examples
///
/// ```sh
/// # Print the five latest headlines with a content preview
/// crypto_news
///
/// # Ten articles with images, saved as JSON and an HTML report
/// crypto_news --limit 10 --download-images --json --html
///
/// # Also generate styled pages with Gemini
/// GOOGLE_API_KEY=... crypto_news --json --download-images --generate-pages
///
/// # Restyle the images of an earlier run without scraping again
/// GOOGLE_API_KEY=... crypto_news --from-json crypto_news.json --restyle-images
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("local_images").args(["download_images", "from_json"]).multiple(true)))]
pub struct Cli {
    /// Save results to a JSON file
    #[arg(long)]
    pub json: bool,

    /// Save results to a CSV file
    #[arg(long)]
    pub csv: bool,

    /// Save results to a text file
    #[arg(long)]
    pub text: bool,

    /// Create an HTML report with images
    #[arg(long)]
    pub html: bool,

    /// Output filename prefix
    #[arg(long, default_value = "crypto_news")]
    pub output: String,

    /// Directory the output files are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Suppress console output
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Limit the number of articles to fetch (0 for no limit)
    #[arg(short, long, default_value_t = 5)]
    pub limit: usize,

    /// Display full article content
    #[arg(long)]
    pub full: bool,

    /// Only scrape the listing page; do not fetch article bodies
    #[arg(long)]
    pub no_content: bool,

    /// Extract images from articles
    #[arg(long)]
    pub images: bool,

    /// Download images to local storage (implies --images)
    #[arg(long)]
    pub download_images: bool,

    /// Folder to save downloaded images in
    #[arg(long, default_value = "crypto_news_images")]
    pub images_folder: PathBuf,

    /// Listing page to scrape
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Load records from a saved JSON file instead of scraping
    #[arg(long, value_name = "PATH")]
    pub from_json: Option<PathBuf>,

    /// Generate a styled HTML page per article with Gemini
    #[arg(long)]
    pub generate_pages: bool,

    /// Directory for generated pages
    #[arg(long, default_value = "generated_pages")]
    pub pages_dir: PathBuf,

    /// Restyle downloaded images with Gemini (needs --download-images or --from-json)
    #[arg(long, requires = "local_images")]
    pub restyle_images: bool,

    /// Directory for restyled copies and the processing summary
    #[arg(long, default_value = "output")]
    pub restyle_output_dir: PathBuf,

    /// Do not keep a `_backup` copy of restyled images
    #[arg(long)]
    pub no_backup: bool,

    /// Write restyled images to --restyle-output-dir instead of over the originals
    #[arg(long)]
    pub no_overwrite: bool,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for page generation
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub gemini_model: String,

    /// Gemini model used for image editing
    #[arg(long, env = "GEMINI_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub gemini_image_model: String,
}

impl Cli {
    /// Whether images are collected at all.
    pub fn wants_images(&self) -> bool {
        self.images || self.download_images
    }

    /// `<output_dir>/<output><suffix>`.
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}{suffix}", self.output))
    }

    /// Default tracing filter implied by `--quiet`/`--debug`.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
