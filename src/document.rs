//! Accumulates parsed pages and renders the run's dumps.
//!
//! Processors append pages in whatever order they finish. [`Document::finalize`]
//! restores archive order by sorting on page index, then renders:
//! - the full dump, every entry of every page in page order
//! - one dump per tag, entries in the same order
//!
//! Entries whose tag is the empty sentinel (tagging disabled) are grouped
//! under [`UNTAGGED`] so no tag file ends up with an empty name.

use crate::models::{Entry, ParsedPage, RunSummary};
use crate::tagger::{NO_TAG, UNTAGGED};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Document {
    pages: Vec<ParsedPage>,
}

/// Rendered output of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// All entries, page order.
    pub full: String,
    /// `(tag, dump)` pairs, sorted by tag name.
    pub by_tag: Vec<(String, String)>,
    pub summary: RunSummary,
    /// Entries in page order, for the JSON dump.
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, page: ParsedPage) {
        debug!(page = page.index, entries = page.entries.len(), "Page added to document");
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        let pages_fetched = self.pages.iter().filter(|p| p.fetched).count();
        RunSummary {
            pages_processed: self.pages.len(),
            pages_fetched,
            pages_failed: self.pages.len() - pages_fetched,
            entries: self.pages.iter().map(|p| p.entries.len()).sum(),
        }
    }

    /// Sort pages and render every dump. Consumes the document.
    pub fn finalize(mut self) -> Rendered {
        // Stable, so equal indexes keep their append order.
        self.pages.sort_by_key(|p| p.index);
        let summary = self.summary();

        let entries: Vec<Entry> = self.pages.into_iter().flat_map(|p| p.entries).collect();
        let full = render(entries.iter());

        let mut groups: BTreeMap<&str, Vec<&Entry>> = BTreeMap::new();
        for entry in &entries {
            groups.entry(partition_key(&entry.tag)).or_default().push(entry);
        }
        let by_tag = groups
            .into_iter()
            .map(|(tag, group)| (tag.to_string(), render(group.into_iter())))
            .collect();

        Rendered {
            full,
            by_tag,
            summary,
            entries,
        }
    }
}

fn partition_key(tag: &str) -> &str {
    if tag == NO_TAG { UNTAGGED } else { tag }
}

/// Each entry block followed by a blank line.
fn render<'a>(entries: impl Iterator<Item = &'a Entry>) -> String {
    entries.map(|e| format!("{e}\n")).join("")
}
