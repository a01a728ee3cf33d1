//! Post-scan cleanup of watch locations.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::sanitize::redact_path;
use crate::storage;

/// Lowercased extensions without the leading dot.
fn normalized_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.contains(&e.to_ascii_lowercase()))
        .unwrap_or(false)
}

/// Deletes leftover files directly inside each of `folders`.
pub fn delete_leftovers_in(folders: &[PathBuf], extensions: &[String]) -> usize {
    let extensions = normalized_extensions(extensions);
    if extensions.is_empty() {
        return 0;
    }

    let mut deleted = 0;
    for folder in folders {
        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(folder = %folder.display(), error = %e, "Skipping cleanup of folder");
                continue;
            }
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_file() && has_extension(&path, &extensions) {
                deleted += delete_leftover(&path);
            }
        }
    }
    deleted
}

/// Deletes leftover files anywhere below each of `roots`.
pub fn delete_leftovers_recursive(roots: &[PathBuf], extensions: &[String]) -> usize {
    let extensions = normalized_extensions(extensions);
    if extensions.is_empty() {
        return 0;
    }

    let mut deleted = 0;
    for root in roots {
        for entry in WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if has_extension(entry.path(), &extensions) {
                deleted += delete_leftover(entry.path());
            }
        }
    }
    deleted
}

fn delete_leftover(path: &Path) -> usize {
    match storage::delete_file(path) {
        Ok(()) => {
            debug!(file = %redact_path(path), "Deleted leftover file");
            1
        }
        Err(e) => {
            warn!(error = %e, "Could not delete leftover file");
            0
        }
    }
}

/// Removes empty directories below `root`, deepest first. `root` itself is
/// kept. Folders that cannot be removed are left alone.
pub fn remove_empty_folders(root: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        // Fails on non-empty folders and on permission errors; both are fine.
        if std::fs::remove_dir(entry.path()).is_ok() {
            debug!(folder = %entry.path().display(), "Removed empty folder");
            removed += 1;
        }
    }
    removed
}
