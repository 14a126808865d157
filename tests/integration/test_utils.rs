//! Shared test utilities for integration tests
//!
//! Builds package trees in temporary directories and snapshots them so tests
//! can compare the on-disk state before and after a round trip.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// A canonical single-resource YAML document.
pub fn resource(kind: &str, name: &str) -> String {
    format!(
        "apiVersion: v1\nkind: {}\nmetadata:\n  name: {}\n",
        kind, name
    )
}

/// Join documents into one YAML stream.
pub fn stream(docs: &[String]) -> String {
    docs.join("---\n")
}

/// Write `contents` at `rel` under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Every regular file under `root`, keyed by slash-separated relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.insert(rel, fs::read_to_string(entry.path()).unwrap_or_default());
    }
    out
}
