//! Plain-text dumps.

use crate::document::Rendered;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Write `{timestamp}.txt` with every entry.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_full(output_dir: &Path, timestamp: &str, rendered: &Rendered) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(format!("{timestamp}.txt"));
    fs::write(&path, &rendered.full).await?;
    info!(path = %path.display(), entries = rendered.entries.len(), "Wrote full dump");
    Ok(path)
}

/// Append each tag's entries to `{timestamp}_{tag}.txt`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_tags(output_dir: &Path, timestamp: &str, rendered: &Rendered) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut written = Vec::with_capacity(rendered.by_tag.len());
    for (tag, dump) in &rendered.by_tag {
        let path = output_dir.join(format!("{timestamp}_{tag}.txt"));
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(dump.as_bytes()).await?;
        file.flush().await?;
        info!(%tag, path = %path.display(), "Wrote tag dump");
        written.push(path);
    }
    info!(tags = written.len(), "All tag dumps written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::models::{Entry, ParsedPage};

    fn rendered() -> Rendered {
        let entry = |page: usize, title: &str, tag: &str| Entry {
            page_index: page,
            entry_index: 0,
            time: "09:15am EDT".to_string(),
            date: "2026年 10月 18日".to_string(),
            title: title.to_string(),
            content: "body".to_string(),
            tag: tag.to_string(),
        };
        let mut doc = Document::new();
        doc.add(ParsedPage {
            index: 1,
            fetched: true,
            entries: vec![entry(1, "Bar falls", "untagged")],
        });
        doc.add(ParsedPage {
            index: 0,
            fetched: true,
            entries: vec![entry(0, "Foo rises", "econ")],
        });
        doc.finalize()
    }

    #[tokio::test]
    async fn test_write_full_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_full(dir.path(), "2026-10-18_09-30-00", &rendered()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "2026-10-18_09-30-00.txt");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Page 0 Entry 0\nTag: econ\n"));
        assert!(text.find("Foo rises").unwrap() < text.find("Bar falls").unwrap());
    }

    #[tokio::test]
    async fn test_write_tag_dumps() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_tags(dir.path(), "ts", &rendered()).await.unwrap();
        assert_eq!(paths.len(), 2);

        let econ = std::fs::read_to_string(dir.path().join("ts_econ.txt")).unwrap();
        assert!(econ.contains("Foo rises"));
        assert!(!econ.contains("Bar falls"));
        let untagged = std::fs::read_to_string(dir.path().join("ts_untagged.txt")).unwrap();
        assert!(untagged.contains("Bar falls"));
    }

    #[tokio::test]
    async fn test_tag_dumps_append() {
        let dir = tempfile::tempdir().unwrap();
        write_tags(dir.path(), "ts", &rendered()).await.unwrap();
        write_tags(dir.path(), "ts", &rendered()).await.unwrap();
        let econ = std::fs::read_to_string(dir.path().join("ts_econ.txt")).unwrap();
        assert_eq!(econ.matches("Foo rises").count(), 2);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_full(&missing, "ts", &rendered()).await.is_err());
    }
}
