use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StorageError;
use crate::naming::is_video_path;

pub fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory(parent),
        _ => Ok(()),
    }
}

/// Move a file from `src` to `dst`, creating `dst`'s folder. Uses `rename`
/// first and falls back to copy + delete for cross-device moves.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    ensure_parent(dst)?;

    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Copy `src` over `dst`, creating `dst`'s folder.
pub fn copy_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    ensure_parent(dst)?;
    std::fs::copy(src, dst).map_err(|e| StorageError::CopyFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub fn delete_file(path: &Path) -> Result<(), StorageError> {
    std::fs::remove_file(path).map_err(|e| StorageError::DeleteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Size in bytes, or `None` when the path is not a readable file.
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

pub fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Renames files next to `old` whose name starts with `old`'s stem
/// (subtitles, thumbnails, nfo) so they start with `new_stem` instead.
///
/// `old` itself and other videos are left alone, as is any extra whose new
/// name is taken.
/// Returns the new paths. Individual failures are logged and skipped.
pub fn rename_extras(old: &Path, new_stem: &str) -> Vec<PathBuf> {
    let (Some(folder), Some(old_stem)) = (old.parent(), file_stem(old)) else {
        return Vec::new();
    };
    if old_stem == new_stem {
        return Vec::new();
    }

    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Could not list folder for extras");
            return Vec::new();
        }
    };

    let mut renamed = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path == old || !path.is_file() || is_video_path(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(rest) = name.strip_prefix(old_stem) else {
            continue;
        };
        // "Show.srt" and "Show.en.srt" belong to "Show.mkv"; "Show 2.mkv" does not.
        if !rest.starts_with('.') && !rest.starts_with('-') {
            continue;
        }

        let target = folder.join(format!("{}{}", new_stem, rest));
        if target.exists() {
            continue;
        }
        match std::fs::rename(&path, &target) {
            Ok(()) => renamed.push(target),
            Err(e) => {
                let err = StorageError::RenameFile {
                    from: path.clone(),
                    to: target,
                    source: e,
                };
                warn!(error = %err, "Could not rename extra file");
            }
        }
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, bytes: &[u8]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_move_file_creates_parent() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("in/a.mkv");
        let dst = temp.path().join("out/Show/Season 1/a.mkv");
        write(&src, b"data");

        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
    }

    #[test]
    fn test_move_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = move_file(&temp.path().join("nope"), &temp.path().join("x")).unwrap_err();
        assert!(matches!(err, StorageError::MoveFile { .. }));
    }

    #[test]
    fn test_copy_file_keeps_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.mkv");
        let dst = temp.path().join("b/a.mkv");
        write(&src, b"data");

        copy_file(&src, &dst).unwrap();
        assert!(src.exists());
        assert_eq!(file_size(&dst), Some(4));
    }

    #[test]
    fn test_file_size_of_directory_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(file_size(temp.path()), None);
        assert_eq!(file_size(&temp.path().join("missing")), None);
    }

    #[test]
    fn test_rename_extras() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("Show - 1x01.avi");
        write(&old, b"old");
        write(&temp.path().join("Show - 1x01.srt"), b"sub");
        write(&temp.path().join("Show - 1x01.en.srt"), b"sub");
        write(&temp.path().join("Show - 1x01-thumb.jpg"), b"img");
        write(&temp.path().join("Show - 1x012.mkv"), b"other");

        let mut renamed = rename_extras(&old, "Show - 1x01 - Pilot");
        renamed.sort();

        assert_eq!(renamed.len(), 3);
        assert!(temp.path().join("Show - 1x01 - Pilot.srt").exists());
        assert!(temp.path().join("Show - 1x01 - Pilot.en.srt").exists());
        assert!(temp.path().join("Show - 1x01 - Pilot-thumb.jpg").exists());
        assert!(old.exists());
        assert!(temp.path().join("Show - 1x012.mkv").exists());
    }
}
