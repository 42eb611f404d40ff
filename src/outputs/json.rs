//! JSON dump of a run, for downstream tooling.
//!
//! ```json
//! {"timestamp": "2026-10-18_09-30-00", "summary": {...}, "entries": [...]}
//! ```

use crate::document::Rendered;
use crate::models::{Entry, RunSummary};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct RunDump<'a> {
    timestamp: &'a str,
    summary: &'a RunSummary,
    entries: &'a [Entry],
}

/// Write `{timestamp}.json` with the run summary and every entry in page order.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_run(output_dir: &Path, timestamp: &str, rendered: &Rendered) -> Result<PathBuf, Box<dyn Error>> {
    let dump = RunDump {
        timestamp,
        summary: &rendered.summary,
        entries: &rendered.entries,
    };
    let json = serde_json::to_string_pretty(&dump)?;
    let path = output_dir.join(format!("{timestamp}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON dump");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::models::ParsedPage;

    #[tokio::test]
    async fn test_write_run_json() {
        let mut doc = Document::new();
        doc.add(ParsedPage {
            index: 0,
            fetched: true,
            entries: vec![Entry {
                page_index: 0,
                entry_index: 0,
                time: String::new(),
                date: "Oct 17 2026".to_string(),
                title: "Foo".to_string(),
                content: "body".to_string(),
                tag: "econ".to_string(),
            }],
        });
        doc.add(ParsedPage {
            index: 1,
            fetched: false,
            entries: vec![],
        });
        let rendered = doc.finalize();

        let dir = tempfile::tempdir().unwrap();
        let path = write_run(dir.path(), "ts", &rendered).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(value["timestamp"], "ts");
        assert_eq!(value["summary"]["pages_failed"], 1);
        assert_eq!(value["entries"][0]["title"], "Foo");
        assert_eq!(value["entries"].as_array().unwrap().len(), 1);
    }
}
