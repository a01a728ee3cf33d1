//! Helpers for keeping full paths out of span attributes, and for deriving
//! stable identifiers from paths.
//!
//! Watch folders often live under a user's home directory; spans and
//! info-level logs only ever carry the file name.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Stable 32-character hex digest of a path string.
///
/// Used as the organization result id: repeated attempts on the same
/// original path always map to the same row. Must not change between
/// releases, so `DefaultHasher` is not an option here.
pub fn hash_path(path: &Path) -> String {
    hash_str(&path.to_string_lossy())
}

/// Stable 32-character hex digest of an arbitrary string.
pub fn hash_str(value: &str) -> String {
    format!("{:x}", md5::compute(value.as_bytes()))
}
