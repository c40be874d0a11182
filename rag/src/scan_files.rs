use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Config;
use crate::extract::is_supported;

/// Supported documents under `base` (or `base` itself when it is a file),
/// skipping excluded directory names and files over the size limit.
pub fn scan_documents(cfg: &Config, base: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();

    let walker = WalkDir::new(base).sort_by_file_name().into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        e.depth() == 0 || !cfg.exclude_dirs.iter().any(|d| d == &name)
    });

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_supported(path) {
            continue;
        }
        if let Ok(meta) = fs::metadata(path) {
            if meta.len() > cfg.max_file_bytes {
                debug!(path = %path.display(), bytes = meta.len(), "skipping oversized file");
                continue;
            }
        }
        results.push(path.to_path_buf());
    }

    results
}
