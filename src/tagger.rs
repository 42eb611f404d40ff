//! Keyword tagging of story headlines.
//!
//! A [`TagRules`] value is an ordered list of `(tag, keywords)` pairs loaded
//! once before the crawl starts and then shared read-only by every
//! extraction call. Classification is first-match-wins over rules, then over
//! keywords within a rule.
//!
//! # Rule file
//!
//! The file is parsed with `serde_yaml`, so both YAML and JSON work. Either a
//! bare sequence of single-entry mappings:
//!
//! ```yaml
//! - econ: ["GDP", "inflation"]
//! - tech: ["chip", "AI"]
//! ```
//!
//! or the same sequence under a `tag_conf` key:
//!
//! ```json
//! {"tag_conf": [{"econ": ["GDP", "inflation"]}, {"tech": ["chip"]}]}
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Tag given when rules exist but none matched.
pub const UNTAGGED: &str = "untagged";

/// Tag given when no rules were loaded and classification never ran.
pub const NO_TAG: &str = "";

/// Failure to load the tag rule file.
#[derive(Debug, Error)]
pub enum TagConfigError {
    #[error("cannot read tag rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse tag rule file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One tag and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl TagRule {
    #[cfg(test)]
    pub fn new<S: Into<String>>(name: S, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered, immutable rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Wrapped { tag_conf: Vec<serde_yaml::Value> },
    Bare(Vec<serde_yaml::Value>),
}

impl TagRules {
    #[cfg(test)]
    pub fn new(rules: Vec<TagRule>) -> Self {
        Self { rules }
    }

    /// A rule set that disables tagging.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Parse rules from YAML or JSON text.
    ///
    /// Entries that are not single-key mappings of a tag to a keyword list
    /// are skipped with a warning, as are empty keywords (they would match
    /// every title).
    pub fn parse(text: &str, path: &str) -> Result<Self, TagConfigError> {
        let file: RuleFile = serde_yaml::from_str(text).map_err(|source| TagConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        let raw = match file {
            RuleFile::Wrapped { tag_conf } => tag_conf,
            RuleFile::Bare(entries) => entries,
        };

        let mut rules = Vec::with_capacity(raw.len());
        for (position, value) in raw.into_iter().enumerate() {
            let mapping: BTreeMap<String, Vec<String>> = match serde_yaml::from_value(value) {
                Ok(mapping) => mapping,
                Err(e) => {
                    warn!(position, error = %e, "Malformed tag rule; skipping");
                    continue;
                }
            };
            if mapping.len() != 1 {
                warn!(position, keys = mapping.len(), "Tag rule is not a single-entry mapping; skipping");
                continue;
            }
            for (name, keywords) in mapping {
                let before = keywords.len();
                let keywords: Vec<String> = keywords.into_iter().filter(|k| !k.is_empty()).collect();
                if keywords.len() != before {
                    warn!(tag = %name, dropped = before - keywords.len(), "Dropped empty keywords");
                }
                rules.push(TagRule { name, keywords });
            }
        }
        Ok(Self { rules })
    }

    /// Load rules from a file.
    ///
    /// A missing or unreadable file is not fatal: the error is logged as a
    /// warning and tagging is disabled for the run.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_or_disable<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(rules) => {
                info!(rules = rules.len(), "Loaded tag rules");
                rules
            }
            Err(e) => {
                warn!(error = %e, "Tag rules unavailable; tagging disabled");
                Self::disabled()
            }
        }
    }

    fn load(path: &Path) -> Result<Self, TagConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| TagConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&text, &display)
    }

    /// Classify a headline.
    ///
    /// Returns the first rule whose keyword occurs in `title`, [`UNTAGGED`]
    /// when rules exist but none matched, and [`NO_TAG`] when the set is empty.
    pub fn classify(&self, title: &str) -> &str {
        if self.rules.is_empty() {
            return NO_TAG;
        }
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|word| title.contains(word.as_str())))
            .map_or(UNTAGGED, |rule| rule.name.as_str())
    }
}
