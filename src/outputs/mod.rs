//! File writers for a finished run.
//!
//! # Submodules
//!
//! - [`text`]: Full dump and per-tag dumps as human-readable text
//! - [`json`]: Optional machine-readable dump of the whole run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2026-10-18_09-30-00.txt          # every entry, page order
//! ├── 2026-10-18_09-30-00_econ.txt     # --tag: one file per tag
//! ├── 2026-10-18_09-30-00_untagged.txt
//! └── 2026-10-18_09-30-00.json         # --json
//! ```
//!
//! Write failures are returned to the caller; the run has no way to recover
//! its fetched pages once output fails, so `main` treats them as fatal.

pub mod json;
pub mod text;

/// File stem format shared by every output of one run.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
