//! # Archive Tagger
//!
//! Crawls the paginated Reuters China news archive, extracts the stories on
//! each page, tags them by keyword rules and writes a text dump per run plus
//! one per tag.
//!
//! ## Usage
//!
//! ```sh
//! archive_tagger -p 10 -d 1 --downloader-count 4 -t -c tag_configure.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Dispatch**: One job per archive page goes onto the job queue
//! 2. **Download**: A pool of downloaders drains the jobs through one shared HTTP client
//! 3. **Process**: Processors extract and tag stories into the document as pages arrive
//! 4. **Output**: The document is sorted by page and written once everything has drained

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod document;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod queue;
mod scrapers;
mod tagger;
mod utils;

use cli::Cli;
use fetcher::{ARCHIVE_URL, HttpPageSource, PAGE_SIZE};
use outputs::{json, text};
use scrapers::ExtractContext;
use scrapers::reuters::ReutersArchiveParser;
use tagger::TagRules;
use utils::{ensure_writable_dir, run_timestamp};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let started = Local::now();
    let start_time = std::time::Instant::now();
    info!("archive_tagger starting up");
    debug!(?args, "Parsed CLI arguments");

    // Early check: a crawl whose output cannot be written is wasted work
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let ctx = ExtractContext {
        rules: TagRules::load_or_disable(&args.config),
        run_date: started.date_naive(),
    };
    if ctx.rules.is_empty() {
        info!("No tag rules; entries will carry an empty tag");
    }
    let source = HttpPageSource::new(ARCHIVE_URL, PAGE_SIZE, args.request_timeout())?;

    let config = args.pipeline_config();
    info!(
        pages = config.page_count,
        downloaders = config.downloader_count,
        processors = config.processor_count,
        tag_rules = ctx.rules.len(),
        delay = ?config.delay,
        "Starting crawl"
    );
    let document = pipeline::run(&config, source, ReutersArchiveParser, ctx).await;

    // ---- Output ----
    let rendered = document.finalize();
    let timestamp = run_timestamp(started);

    if let Err(e) = text::write_full(&args.output_dir, &timestamp, &rendered).await {
        error!(error = %e, "Failed to write full dump");
        return Err(e);
    }
    if args.tag {
        if let Err(e) = text::write_tags(&args.output_dir, &timestamp, &rendered).await {
            error!(error = %e, "Failed to write tag dumps");
            return Err(e);
        }
    }
    if args.json {
        if let Err(e) = json::write_run(&args.output_dir, &timestamp, &rendered).await {
            error!(error = %e, "Failed to write JSON dump");
            return Err(e);
        }
    }

    let tag_counts = rendered
        .entries
        .iter()
        .counts_by(|e| e.tag.clone())
        .into_iter()
        .sorted()
        .collect::<Vec<_>>();
    let summary = &rendered.summary;
    let elapsed = start_time.elapsed();
    info!(
        pages = summary.pages_processed,
        fetched = summary.pages_fetched,
        failed = summary.pages_failed,
        entries = summary.entries,
        ?tag_counts,
        ?elapsed,
        "Execution complete"
    );

    Ok(())
}
