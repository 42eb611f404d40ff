//! Command-line interface definitions for Archive Tagger.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The output directory can also be supplied through the environment.

use crate::pipeline::PipelineConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the Archive Tagger application.
///
/// # Examples
///
/// ```sh
/// # Crawl 30 pages with 3 downloaders, 2 seconds apart
/// archive_tagger
///
/// # Crawl 5 pages quickly and write one file per tag
/// archive_tagger -p 5 -d 0.5 -t -c tag_configure.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of archive pages to crawl
    #[arg(short, long, default_value_t = 30)]
    pub page_count: usize,

    /// Pause in seconds after each fetch, per downloader
    #[arg(short, long, default_value_t = 2.0, value_parser = parse_delay)]
    pub delay: f64,

    /// Number of concurrent downloaders
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub downloader_count: u32,

    /// Number of concurrent processors
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub processor_count: u32,

    /// Directory for the output text files
    #[arg(short, long, env = "CRAWL_OUTPUT_DIR", default_value = "cnReuters_output")]
    pub output_dir: PathBuf,

    /// Also write one file per tag
    #[arg(short, long)]
    pub tag: bool,

    /// Tag rule file (YAML or JSON)
    #[arg(short, long, default_value = "tag_configure.json")]
    pub config: PathBuf,

    /// Also write a JSON dump of the run
    #[arg(long)]
    pub json: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_delay(s: &str) -> Result<f64, String> {
    let delay: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if delay.is_finite() && delay >= 0.0 {
        Ok(delay)
    } else {
        Err(format!("delay must be a non-negative number of seconds, got {s}"))
    }
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            page_count: self.page_count,
            delay: Duration::from_secs_f64(self.delay),
            downloader_count: self.downloader_count as usize,
            processor_count: self.processor_count as usize,
            ..PipelineConfig::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
