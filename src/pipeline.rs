//! The concurrent fetch/parse pipeline.
//!
//! ```text
//! dispatch ──► jobs ──► downloader × N ──► results ──► processor × M ──► Document
//! ```
//!
//! # Termination
//!
//! Processors have no end-of-stream marker. Before every take they check
//! "every downloader task has finished AND the result queue is empty", and
//! exit only when both hold. A downloader pushes each page before it
//! acknowledges the job, and its task can only be observed finished after
//! its loop has returned, so once a downloader reads as finished every page
//! it produced is already in the queue. Checking the downloaders first and
//! the queue second therefore cannot miss a page.
//!
//! # Failure isolation
//!
//! A fetch never fails outward (see [`PageSource`]). A panic inside a fetch
//! is caught at the job boundary and turned into a failed [`RawPage`], and
//! the job is still acknowledged, so exactly one page is produced per job.
//! Extraction has the same boundary on the processor side: a parser panic
//! costs that page's entries, never the run.

use crate::document::Document;
use crate::fetcher::PageSource;
use crate::models::{Job, ParsedPage, RawPage};
use crate::queue::WorkQueue;
use crate::scrapers::{ExtractContext, PageParser, extract};
use futures::FutureExt;
use futures::future::join_all;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

/// How often idle workers re-check their exit condition.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Pipeline sizing and pacing.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub page_count: usize,
    /// Pause after each fetch, per downloader.
    pub delay: Duration,
    pub downloader_count: usize,
    pub processor_count: usize,
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_count: 30,
            delay: Duration::from_secs(2),
            downloader_count: 3,
            processor_count: 1,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Queue one job per page index in `[0, page_count)`.
pub fn dispatch(page_count: usize, jobs: &WorkQueue<Job>) {
    for index in 0..page_count {
        jobs.push(Job { index });
    }
    info!(page_count, "Jobs dispatched");
}

/// Run one crawl to completion and return the filled document.
///
/// `source` is owned by the run and dropped exactly once, after every
/// downloader and processor has stopped.
pub async fn run<S, P>(config: &PipelineConfig, source: S, parser: P, ctx: ExtractContext) -> Document
where
    S: PageSource + 'static,
    P: PageParser,
{
    let t0 = Instant::now();
    let source: Arc<dyn PageSource> = Arc::new(source);
    let jobs: Arc<WorkQueue<Job>> = Arc::new(WorkQueue::new());
    let results: Arc<WorkQueue<RawPage>> = Arc::new(WorkQueue::new());

    dispatch(config.page_count, &jobs);

    let downloaders: Vec<JoinHandle<()>> = (0..config.downloader_count.max(1))
        .map(|worker| {
            tokio::spawn(
                downloader(
                    worker,
                    Arc::clone(&jobs),
                    Arc::clone(&results),
                    Arc::clone(&source),
                    config.delay,
                    config.poll_interval,
                )
                .instrument(info_span!("downloader", worker)),
            )
        })
        .collect();

    let document = Mutex::new(Document::new());
    let processors = join_all((0..config.processor_count.max(1)).map(|worker| {
        processor(
            worker,
            &results,
            &downloaders,
            &document,
            &parser,
            &ctx,
            config.poll_interval,
        )
        .instrument(info_span!("processor", worker))
    }));

    // Every job acknowledged, and every processor out of its loop.
    tokio::join!(jobs.join(), processors);
    // Processors only leave once the queue is empty, so every page they took
    // has been acknowledged and this resolves at once.
    results.join().await;

    for handle in downloaders {
        if let Err(e) = handle.await {
            error!(error = %e, "Downloader task ended abnormally");
        }
    }
    drop(source);

    let document = document.into_inner();
    if document.len() != config.page_count {
        error!(
            dispatched = config.page_count,
            processed = document.len(),
            "Processed page count does not match dispatched jobs"
        );
    }
    let summary = document.summary();
    info!(
        dispatched = config.page_count,
        pages = summary.pages_processed,
        fetched = summary.pages_fetched,
        failed = summary.pages_failed,
        entries = summary.entries,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Pipeline drained"
    );
    document
}

/// Drain jobs until the queue is observed empty.
///
/// Returning from this function is the worker's completion signal, so the
/// push of its last page always happens before it.
pub async fn downloader(
    worker: usize,
    jobs: Arc<WorkQueue<Job>>,
    results: Arc<WorkQueue<RawPage>>,
    source: Arc<dyn PageSource>,
    delay: Duration,
    poll_interval: Duration,
) {
    let t0 = Instant::now();
    info!(worker, "Downloader starts");
    let mut fetched = 0usize;
    let mut failed = 0usize;
    while !jobs.is_empty() {
        let Some(job) = jobs.take(poll_interval).await else {
            continue;
        };
        let page = match AssertUnwindSafe(source.fetch(&job)).catch_unwind().await {
            Ok(page) => page,
            Err(_) => {
                error!(worker, page = job.index, "Fetch panicked; page recorded as failed");
                RawPage::failed(job.index)
            }
        };
        if page.is_failed() {
            failed += 1;
        }
        results.push(page);
        jobs.task_done();
        fetched += 1;
        tokio::time::sleep(delay).await;
    }
    info!(
        worker,
        fetched,
        failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Downloader finished"
    );
}

/// Extract and tag raw pages until the downloaders are done and the result
/// queue is drained.
pub async fn processor(
    worker: usize,
    results: &WorkQueue<RawPage>,
    downloaders: &[JoinHandle<()>],
    document: &Mutex<Document>,
    parser: &dyn PageParser,
    ctx: &ExtractContext,
    poll_interval: Duration,
) {
    let t0 = Instant::now();
    info!(worker, "Processor starts");
    let mut processed = 0usize;
    loop {
        // Producers first, queue second.
        if downloaders.iter().all(|h| h.is_finished()) && results.is_empty() {
            break;
        }
        let Some(raw) = results.take(poll_interval).await else {
            continue;
        };
        let page = match std::panic::catch_unwind(AssertUnwindSafe(|| extract(&raw, parser, ctx))) {
            Ok(page) => page,
            Err(_) => {
                error!(worker, page = raw.index, "Extraction panicked; page kept without entries");
                ParsedPage {
                    index: raw.index,
                    fetched: raw.content.is_some(),
                    entries: Vec::new(),
                }
            }
        };
        debug!(
            worker,
            page = page.index,
            entries = page.entries.len(),
            backlog = results.len(),
            "Processed page"
        );
        document.lock().add(page);
        results.task_done();
        processed += 1;
        tokio::task::yield_now().await;
    }
    info!(
        worker,
        processed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Processor finished"
    );
}
