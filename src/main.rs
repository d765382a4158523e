//! # crypto_news
//!
//! Scrapes the latest cryptocurrency news from crypto.news, extracts article
//! text and images with layout-tolerant heuristics, and writes the results
//! as JSON, CSV, plain text and an HTML report.
//!
//! ## Features
//!
//! - Locates article teasers on the listing page with an ordered cascade of
//!   structural strategies, so small layout changes do not break the run
//! - Fetches each article and extracts its main text and content images
//! - Optionally downloads images into one folder per article
//! - Optionally generates styled per-article pages and restyles downloaded
//!   images with Google Gemini
//!
//! ## Usage
//!
//! ```sh
//! crypto_news --limit 10 --images --json --html
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Fetch the listing page and extract one record per teaser
//! 2. **Fetching**: Download article bodies and images (sequentially)
//! 3. **Output**: Console display and the requested report files
//! 4. **AI (optional)**: Page generation and image restyling
//!
//! With `--from-json` steps 1 and 2 are replaced by loading a saved run.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod extract;
mod fetch;
mod genai;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use fetch::HttpFetcher;
use genai::gemini::GeminiClient;
use genai::restyle::RestyleOptions;
use genai::{RetryGenerate, pages, restyle};
use models::{NewsRecord, ScrapeOutcome};
use outputs::console::{self, DisplayOptions};
use outputs::{csv, html, json, text};
use scrapers::ScrapeError;
use scrapers::crypto_news::{ScrapeOptions, scrape_latest};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("crypto_news starting up");
    debug!(limit = args.limit, base_url = %args.base_url, output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    // ---- Scrape or load ----
    let outcome = match &args.from_json {
        Some(path) => json::read_json(path).await.unwrap_or_else(|e| {
            error!(path = %path.display(), error = %e, "Could not load saved records");
            ScrapeOutcome::Failed {
                error: format!("Could not load {}: {e}", path.display()),
            }
        }),
        None => match run_scrape(&args).await {
            Ok(records) => ScrapeOutcome::Records(records),
            Err(e) => {
                error!(error = %e, "Scrape failed");
                ScrapeOutcome::Failed {
                    error: e.to_string(),
                }
            }
        },
    };

    if !args.quiet {
        console::display(
            &outcome,
            DisplayOptions {
                full_content: args.full,
                show_images: args.wants_images(),
            },
        );
    }

    // ---- Output files ----
    if args.json || args.csv || args.text || args.html {
        ensure_writable_dir(&args.output_dir).await.inspect_err(|e| {
            error!(
                path = %args.output_dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
        })?;
    }

    if args.json {
        let path = args.output_path(".json");
        report_write("JSON", &path, json::write_json(&outcome, &path).await);
    }
    if args.csv {
        let path = args.output_path(".csv");
        report_write("CSV", &path, csv::write_csv(&outcome, &path).await);
    }
    if args.text {
        let path = args.output_path(".txt");
        report_write("text", &path, text::write_text(&outcome, &path).await);
    }
    if args.html {
        let path = args.output_path("_report.html");
        report_write("HTML report", &path, html::write_html_report(&outcome, &path).await);
    }

    // ---- AI collaborators ----
    if let Some(records) = outcome.records().filter(|r| !r.is_empty()) {
        run_genai(&args, records).await;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(match outcome {
        ScrapeOutcome::Records(_) => ExitCode::SUCCESS,
        ScrapeOutcome::Failed { .. } => ExitCode::FAILURE,
    })
}

#[instrument(level = "info", skip_all)]
async fn run_scrape(args: &Cli) -> Result<Vec<NewsRecord>, ScrapeError> {
    let options = ScrapeOptions {
        limit: args.limit,
        fetch_content: !args.no_content,
        extract_images: args.wants_images(),
        download_images: args.download_images,
        images_folder: args.images_folder.clone(),
        ..ScrapeOptions::for_base_url(&args.base_url)?
    };
    info!(base_url = %options.base_url, "Fetching the latest news");

    let fetcher = HttpFetcher::new()?;
    scrape_latest(&fetcher, &options).await
}

fn report_write(kind: &str, path: &Path, result: Result<bool, Box<dyn Error>>) {
    match result {
        Ok(true) => info!(path = %path.display(), "{kind} saved"),
        Ok(false) => debug!(path = %path.display(), "Nothing to write for {kind}"),
        Err(e) => error!(path = %path.display(), error = %e, "Failed to write {kind}"),
    }
}

#[instrument(level = "info", skip_all)]
async fn run_genai(args: &Cli, records: &[NewsRecord]) {
    if !args.generate_pages && !args.restyle_images {
        return;
    }
    let Some(api_key) = args.gemini_api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("Gemini API key missing (set GOOGLE_API_KEY or --gemini-api-key); skipping AI steps");
        return;
    };

    if args.generate_pages {
        let model = RetryGenerate::with_default_policy(GeminiClient::new(api_key, &args.gemini_model));
        match pages::generate_pages(&model, records, &args.pages_dir).await {
            Ok(written) => info!(count = written.len(), dir = %args.pages_dir.display(), "Generated HTML pages"),
            Err(e) => error!(error = %e, "Page generation failed"),
        }
    }

    if args.restyle_images {
        let model =
            RetryGenerate::with_default_policy(GeminiClient::new(api_key, &args.gemini_image_model));
        let options = RestyleOptions {
            output_dir: args.restyle_output_dir.clone(),
            backup: !args.no_backup,
            overwrite: !args.no_overwrite,
            ..Default::default()
        };
        match restyle::restyle_images(&model, records, &options).await {
            Ok(results) => info!(count = results.len(), "Restyled images"),
            Err(e) => error!(error = %e, "Image restyling failed"),
        }
    }
}
