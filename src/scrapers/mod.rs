//! Turning archive HTML into tagged [`Entry`] records.
//!
//! Site-specific selectors live behind the [`PageParser`] trait so the
//! pipeline never depends on one archive's markup. [`extract`] wraps a
//! parser with the failure boundaries the crawl relies on:
//!
//! | Failure | Result |
//! |---------|--------|
//! | Fetch failed (no body) | empty entry list |
//! | Page structure not recognised | empty entry list, logged |
//! | One story malformed | that story skipped, logged, the rest kept |
//!
//! # Supported Sources
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | Reuters China archive | [`reuters`] | `section.module-content` story list |

pub mod reuters;

use crate::models::{Entry, ParsedPage, RawPage};
use crate::tagger::TagRules;
use crate::utils::truncate_for_log;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t]").unwrap());

/// Why a page or a single story could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("story list container `{0}` not found")]
    MissingContainer(&'static str),
    #[error("story node `{0}` not found")]
    MissingNode(&'static str),
}

/// Text pulled out of one story node, before normalisation and tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFields {
    pub title: String,
    pub content: String,
    /// Either a time of day (`10:42am EDT`) or a calendar date.
    pub date_or_time: String,
}

/// Locates stories in one archive page.
///
/// The outer `Result` covers the page as a whole; each inner `Result` covers
/// one story, in document order.
pub trait PageParser: Send + Sync {
    fn articles(&self, html: &str) -> Result<Vec<Result<ArticleFields, ExtractError>>, ExtractError>;
}

/// Everything extraction needs besides the page itself.
///
/// Built once per run and shared read-only by every processor.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub rules: TagRules,
    /// Stamped on stories that only carry a time of day.
    pub run_date: NaiveDate,
}

/// Parse a fetched page into tagged entries.
///
/// Never fails: every error is logged and becomes an empty or shorter list.
pub fn extract(raw: &RawPage, parser: &dyn PageParser, ctx: &ExtractContext) -> ParsedPage {
    let Some(html) = raw.content.as_deref() else {
        debug!(page = raw.index, "No content to extract");
        return ParsedPage {
            index: raw.index,
            fetched: false,
            entries: Vec::new(),
        };
    };

    let articles = match parser.articles(html) {
        Ok(articles) => articles,
        Err(e) => {
            warn!(page = raw.index, error = %e, "Page structure not recognised; no entries");
            Vec::new()
        }
    };

    let mut entries = Vec::with_capacity(articles.len());
    for (entry_index, article) in articles.into_iter().enumerate() {
        match article {
            Ok(fields) => entries.push(build_entry(raw.index, entry_index, fields, ctx)),
            Err(e) => warn!(page = raw.index, entry = entry_index, error = %e, "Skipping malformed story"),
        }
    }

    debug!(
        page = raw.index,
        entries = entries.len(),
        fetched_at = %raw.fetched_at.format("%H:%M:%S%.3f"),
        "Extracted page"
    );
    ParsedPage {
        index: raw.index,
        fetched: true,
        entries,
    }
}

fn build_entry(page_index: usize, entry_index: usize, fields: ArticleFields, ctx: &ExtractContext) -> Entry {
    let title = strip_line_breaks(&fields.title);
    let content = strip_line_breaks(&fields.content);
    let (time, date) = split_date_or_time(fields.date_or_time, ctx.run_date);
    let tag = ctx.rules.classify(&title).to_string();
    debug!(
        page = page_index,
        entry = entry_index,
        %date,
        %tag,
        title = %truncate_for_log(&title, 40),
        "Tagged entry"
    );
    Entry {
        page_index,
        entry_index,
        time,
        date,
        title,
        content,
        tag,
    }
}

/// Remove newlines and tabs.
pub fn strip_line_breaks(s: &str) -> String {
    LINE_BREAKS.replace_all(s, "").into_owned()
}

/// Split a story timestamp into `(time, date)`.
///
/// Recent stories show only a time of day; those get `run_date`, so a later
/// run re-stamps them with that run's date.
pub fn split_date_or_time(date_or_time: String, run_date: NaiveDate) -> (String, String) {
    if date_or_time.contains(':') {
        let date = format!(
            "{}年 {}月 {}日",
            run_date.year(),
            run_date.month(),
            run_date.day()
        );
        (date_or_time, date)
    } else {
        (String::new(), date_or_time)
    }
}
