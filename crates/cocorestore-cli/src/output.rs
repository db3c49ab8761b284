//! Output materialization helpers.
//!
//! Everything the pipeline writes goes through here: directory creation,
//! collision-safe path allocation, stable pretty-printed JSON, and the
//! per-category index documents.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Create a directory and its parents if absent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create output directory {}", path.display()))
}

/// Allocate an unused path `<dir>/<stem><suffix>`.
///
/// On collision, numeric suffixes are probed before the extension
/// (`stem_1`, `stem_2`, …) until an unused name is found; an existing file
/// is never silently overwritten.
pub fn unique_path(dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}{}", stem, suffix));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}{}", stem, counter, suffix));
        counter += 1;
    }
    candidate
}

/// Write a value as stable, human-diffable pretty JSON.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// One produced output, by recovered name and resulting path.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub path: String,
}

/// Per-category index document enumerating what was produced.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryIndex {
    pub clips: Vec<IndexEntry>,
    /// Provenance note for heuristically derived categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Write a category index as `index.json` inside its output directory.
pub fn write_index(dir: &Path, index: &CategoryIndex) -> Result<()> {
    write_json_pretty(&dir.join("index.json"), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unique_path_probes_numbered_siblings() {
        let dir = TempDir::new().unwrap();
        let first = unique_path(dir.path(), "run", ".anim.json");
        assert_eq!(first, dir.path().join("run.anim.json"));
        fs::write(&first, b"{}").unwrap();

        let second = unique_path(dir.path(), "run", ".anim.json");
        assert_eq!(second, dir.path().join("run_1.anim.json"));
        fs::write(&second, b"{}").unwrap();

        let third = unique_path(dir.path(), "run", ".anim.json");
        assert_eq!(third, dir.path().join("run_2.anim.json"));
        // The pre-existing files are untouched.
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn index_note_is_omitted_when_absent() {
        let dir = TempDir::new().unwrap();
        let plain = CategoryIndex {
            clips: vec![IndexEntry {
                name: "run".to_owned(),
                path: "animations/run.anim.json".to_owned(),
            }],
            note: None,
        };
        write_index(dir.path(), &plain).unwrap();
        let text = fs::read_to_string(dir.path().join("index.json")).unwrap();
        assert!(text.contains("\"run\""));
        assert!(!text.contains("note"));

        let noted = CategoryIndex {
            clips: Vec::new(),
            note: Some("best-effort".to_owned()),
        };
        write_index(dir.path(), &noted).unwrap();
        let text = fs::read_to_string(dir.path().join("index.json")).unwrap();
        assert!(text.contains("best-effort"));
    }
}
