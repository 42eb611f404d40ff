//! Data models for archive pages and the stories extracted from them.
//!
//! This module defines the records that flow through the crawl pipeline:
//! - [`Job`]: One archive page index waiting to be fetched
//! - [`RawPage`]: The fetch outcome for a job, with or without a body
//! - [`Entry`]: One tagged story extracted from a page
//! - [`ParsedPage`]: A page after extraction, owning its entries
//!
//! Lifecycle: `Job -> RawPage -> (zero or more) Entry`.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// A unit of fetch work identifying one archive page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Zero-based page number in the archive.
    pub index: usize,
}

/// The outcome of fetching one [`Job`].
///
/// `content` is `None` when the fetch failed. Failed pages are still sent
/// downstream so they show up in the run counts.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Page number of the job that produced this page.
    pub index: usize,
    /// The response body, absent on transport failure or non-success status.
    pub content: Option<String>,
    /// When the fetch finished.
    pub fetched_at: DateTime<Local>,
}

impl RawPage {
    /// A successfully fetched page.
    pub fn fetched(index: usize, content: String) -> Self {
        Self {
            index,
            content: Some(content),
            fetched_at: Local::now(),
        }
    }

    /// A page whose fetch failed.
    pub fn failed(index: usize) -> Self {
        Self {
            index,
            content: None,
            fetched_at: Local::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.content.is_none()
    }
}

/// One story extracted from an archive page.
///
/// The tag is assigned once when the entry is built and is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Page the story was found on.
    pub page_index: usize,
    /// Position of the story within its page, in document order.
    pub entry_index: usize,
    /// Time of day as printed on the page, empty when the page only gave a date.
    pub time: String,
    /// Calendar date of the story.
    pub date: String,
    /// Headline with newlines and tabs removed.
    pub title: String,
    /// Teaser paragraph with newlines and tabs removed.
    pub content: String,
    /// Tag assigned by the keyword rules.
    pub tag: String,
}

/// Human-readable block used by the text dumps.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page {} Entry {}", self.page_index, self.entry_index)?;
        writeln!(f, "Tag: {}", self.tag)?;
        writeln!(f, "Date: {} {}", self.date, self.time)?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.content)
    }
}

/// A page after extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedPage {
    /// Page number in the archive.
    pub index: usize,
    /// Whether the fetch produced a body at all.
    pub fetched: bool,
    /// Stories in document order. Empty for failed fetches and unparseable pages.
    pub entries: Vec<Entry>,
}

/// Per-run counters reported at shutdown and in the JSON dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pages_processed: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry {
            page_index: 2,
            entry_index: 0,
            time: "10:42am EDT".to_string(),
            date: "2026年 10月 18日".to_string(),
            title: "Markets rally".to_string(),
            content: "Stocks rose on Monday.".to_string(),
            tag: "econ".to_string(),
        }
    }

    #[test]
    fn test_entry_display_block() {
        let text = entry().to_string();
        assert_eq!(
            text,
            "Page 2 Entry 0\nTag: econ\nDate: 2026年 10月 18日 10:42am EDT\nMarkets rally\nStocks rose on Monday.\n"
        );
    }

    #[test]
    fn test_raw_page_failed_has_no_content() {
        let page = RawPage::failed(4);
        assert_eq!(page.index, 4);
        assert!(page.is_failed());
        assert!(page.content.is_none());
    }

    #[test]
    fn test_raw_page_fetched_keeps_body() {
        let page = RawPage::fetched(1, "<html></html>".to_string());
        assert!(!page.is_failed());
        assert_eq!(page.content.as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_string(&entry()).unwrap();
        assert!(json.contains("\"page_index\":2"));
        assert!(json.contains("\"tag\":\"econ\""));
    }
}
