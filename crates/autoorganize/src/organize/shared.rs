//! Pieces shared by the episode and movie organizers.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::OrganizeOptionsCommon;
use crate::db::ResultStore;
use crate::error::OrganizeError;
use crate::events::{EventBroadcaster, OrganizationEvent};
use crate::library::{
    FileNameParser, LibraryCatalog, LibraryMonitor, MetadataResolver, RemoteSearchResult,
};
use crate::naming::{best_match, is_video_path, match_score, normalize, unique_best_match};
use crate::organize::registry::{InProgressGuard, InProgressRegistry};
use crate::organize::result::{
    FileOrganizerKind, FileSortingStatus, OrganizationResult, SmartMatchEntry,
};
use crate::sanitize::redact_path;
use crate::storage;

/// Per-identity async locks around "create item if absent".
///
/// Only serializes creation inside this process.
#[derive(Clone, Default)]
pub struct CreationLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl CreationLocks {
    pub fn key(kind: FileOrganizerKind, name: &str, year: Option<i32>) -> String {
        format!(
            "{}|{}|{}",
            kind.as_str(),
            normalize(name).to_lowercase(),
            year.map(|y| y.to_string()).unwrap_or_default()
        )
    }

    pub fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Runs `work` while holding the lock for `key`. The entry is dropped
    /// from the map once nobody else holds or waits on it.
    pub async fn with_lock<F>(&self, key: &str, work: F) -> F::Output
    where
        F: Future,
    {
        let lock = self.lock_for(key);
        let output = {
            let _held = lock.lock().await;
            work.await
        };
        drop(lock);
        self.prune(key);
        output
    }

    fn prune(&self, key: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collaborators and state both organizers work against.
#[derive(Clone)]
pub struct OrganizerContext {
    pub catalog: Arc<dyn LibraryCatalog>,
    pub resolver: Arc<dyn MetadataResolver>,
    pub monitor: Arc<dyn LibraryMonitor>,
    pub parser: Arc<dyn FileNameParser>,
    pub store: ResultStore,
    pub registry: InProgressRegistry,
    pub events: EventBroadcaster,
    pub creation_locks: CreationLocks,
}

impl OrganizerContext {
    pub fn new(
        catalog: Arc<dyn LibraryCatalog>,
        resolver: Arc<dyn MetadataResolver>,
        monitor: Arc<dyn LibraryMonitor>,
        parser: Arc<dyn FileNameParser>,
        store: ResultStore,
    ) -> Self {
        Self {
            catalog,
            resolver,
            monitor,
            parser,
            store,
            registry: InProgressRegistry::new(),
            events: EventBroadcaster::default(),
            creation_locks: CreationLocks::default(),
        }
    }

    pub(crate) fn previous_result(&self, id: &str) -> Option<OrganizationResult> {
        match self.store.get_result(id) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "Could not read previous organization result");
                None
            }
        }
    }

    /// Saves `result` unless nothing worth recording changed, and announces it.
    pub(crate) fn persist(&self, result: &OrganizationResult, previous: Option<&OrganizationResult>) {
        if !should_save(previous, result) {
            debug!(status = %result.status, "Result unchanged, not saving");
            return;
        }

        if let Err(e) = self.store.save_result(result) {
            warn!(error = %e, "Failed to save organization result");
            return;
        }

        let event = if previous.is_some() {
            OrganizationEvent::ItemUpdated(result.clone())
        } else {
            OrganizationEvent::ItemAdded(result.clone())
        };
        self.events.send(event);
    }

    /// Claims the result id for the duration of the returned guard.
    pub(crate) fn acquire(&self, result_id: &str) -> Result<InProgressGuard, OrganizeError> {
        self.registry
            .try_acquire(result_id)
            .ok_or(OrganizeError::ConcurrencyConflict)
    }

    /// Moves or copies `source` to `target`, bracketed by monitor
    /// notifications. The caller must hold the result id.
    pub(crate) fn transfer(
        &self,
        source: &Path,
        target: &Path,
        options: &OrganizeOptionsCommon,
    ) -> Result<(), OrganizeError> {
        let target_existed = target.exists();
        let copy = options.copy_original_file || target_existed;

        self.monitor.report_file_system_change_beginning(target);
        let outcome = if copy {
            storage::copy_file(source, target)
        } else {
            storage::move_file(source, target)
        };
        self.monitor.report_file_system_change_complete(target, true);
        outcome?;

        debug!(
            source = %source.display(),
            target = %target.display(),
            copied = copy,
            "File transferred"
        );

        // Copied only because the target was in the way: the source is now redundant.
        if target_existed && !options.copy_original_file {
            if let Err(e) = storage::delete_file(source) {
                warn!(
                    file = %redact_path(source),
                    error = %e,
                    "Copied file but could not delete the original; leaving it in place"
                );
            }
        }

        Ok(())
    }

    /// Deletes overwritten duplicates. Extras next to a duplicate in the
    /// target's folder are renamed to follow the new file.
    pub(crate) fn remove_duplicates(&self, duplicates: &[String], target: &Path) {
        let new_stem = storage::file_stem(target);
        for duplicate in duplicates {
            let duplicate = Path::new(duplicate);
            if duplicate == target || !duplicate.exists() {
                continue;
            }

            self.monitor.report_file_system_change_beginning(duplicate);
            match storage::delete_file(duplicate) {
                Ok(()) => {
                    info!(file = %redact_path(duplicate), "Deleted duplicate");
                    if duplicate.parent() == target.parent() {
                        if let Some(stem) = new_stem {
                            storage::rename_extras(duplicate, stem);
                        }
                    }
                }
                // Extras stay with the video they belong to.
                Err(e) => warn!(error = %e, "Could not delete duplicate"),
            }
            self.monitor.report_file_system_change_complete(duplicate, true);
        }
    }

    /// [`transfer`](Self::transfer) on the blocking thread pool.
    pub(crate) async fn transfer_blocking(
        &self,
        source: &Path,
        target: &Path,
        options: &OrganizeOptionsCommon,
    ) -> Result<(), OrganizeError> {
        let ctx = self.clone();
        let (source, target, options) = (source.to_path_buf(), target.to_path_buf(), options.clone());
        tokio::task::spawn_blocking(move || ctx.transfer(&source, &target, &options))
            .await
            .map_err(|e| OrganizeError::BackgroundTask(e.to_string()))?
    }

    /// [`remove_duplicates`](Self::remove_duplicates) on the blocking thread pool.
    pub(crate) async fn remove_duplicates_blocking(&self, duplicates: &[String], target: &Path) {
        let ctx = self.clone();
        let (duplicates, target) = (duplicates.to_vec(), target.to_path_buf());
        if let Err(e) =
            tokio::task::spawn_blocking(move || ctx.remove_duplicates(&duplicates, &target)).await
        {
            warn!(error = %e, "Duplicate cleanup task failed");
        }
    }

    /// Remembers `extracted_name` as an alias of the chosen item.
    pub(crate) fn remember(
        &self,
        kind: FileOrganizerKind,
        item_name: &str,
        display_name: &str,
        extracted_name: Option<&str>,
    ) {
        let Some(extracted) = extracted_name.map(str::trim) else {
            return;
        };
        if extracted.chars().count() < 3 {
            debug!("Extracted name too short to remember");
            return;
        }
        match self
            .store
            .add_match_string(kind, item_name, display_name, extracted)
        {
            Ok(entry) => debug!(entry = %entry.id, "Remembered correction"),
            Err(e) => warn!(error = %e, "Failed to remember correction"),
        }
    }

    /// Item name of the smart match entry that lists `extracted` as an alias.
    pub(crate) fn smart_match_item(&self, kind: FileOrganizerKind, extracted: &str) -> Option<String> {
        let entries = match self.store.smart_matches_for_kind(kind) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Could not load smart matches");
                return None;
            }
        };
        entries
            .into_iter()
            .find(|entry: &SmartMatchEntry| entry.contains(extracted))
            .map(|entry| entry.item_name)
    }

    /// Re-runs the transfer of a logged result to its stored target,
    /// overwriting whatever is there and removing the recorded duplicates.
    pub fn reorganize(
        &self,
        mut result: OrganizationResult,
        options: &OrganizeOptionsCommon,
    ) -> OrganizationResult {
        let previous = result.clone();
        let source = PathBuf::from(&result.original_path);
        result.date = chrono::Utc::now();
        if let Some(size) = storage::file_size(&source) {
            result.file_size = size;
        }

        let outcome = self.reorganize_inner(&source, &result, options);
        match outcome {
            Ok(()) => {
                result.succeed();
                info!(file = %redact_path(&source), "File reorganized");
            }
            Err(e) => {
                warn!(file = %redact_path(&source), error = %e, "Reorganize failed");
                result.fail(e.to_string());
            }
        }

        self.persist(&result, Some(&previous));
        result
    }

    fn reorganize_inner(
        &self,
        source: &Path,
        result: &OrganizationResult,
        options: &OrganizeOptionsCommon,
    ) -> Result<(), OrganizeError> {
        if self.monitor.is_path_locked(source) {
            return Err(OrganizeError::PathLocked);
        }
        let target = result
            .target_path
            .as_deref()
            .map(PathBuf::from)
            .ok_or_else(|| OrganizeError::Configuration("No target path recorded".to_string()))?;

        let _guard = self.acquire(&result.id)?;
        self.transfer(source, &target, options)?;
        self.remove_duplicates(&result.duplicate_paths, &target);
        Ok(())
    }
}

/// Decides whether a new attempt is worth writing over the previous record.
///
/// Not saved: an attempt that never got as far as a kind when a record
/// already exists, or a repeat of the same non-success outcome.
pub fn should_save(previous: Option<&OrganizationResult>, new: &OrganizationResult) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    if new.kind == FileOrganizerKind::Unknown {
        return false;
    }
    let unchanged = previous.status == new.status
        && previous.status_message == new.status_message
        && previous.kind == new.kind;
    !(unchanged && new.status != FileSortingStatus::Success)
}

/// Target-path conflict, if any: the SkippedExisting message to record.
pub fn existing_target_conflict(target: &Path, source_size: u64) -> Option<String> {
    let existing = storage::file_size(target)?;
    if existing == source_size {
        Some(format!(
            "File already copied to {} (same size)",
            redact_path(target)
        ))
    } else {
        Some(format!("File already exists at {}", redact_path(target)))
    }
}

/// Other videos in `target`'s folder with `target`'s base name.
pub fn same_stem_videos(target: &Path) -> Vec<PathBuf> {
    let (Some(folder), Some(stem)) = (target.parent(), storage::file_stem(target)) else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p != target && p.is_file() && is_video_path(p))
        .filter(|p| storage::file_stem(p) == Some(stem))
        .collect();
    found.sort();
    found
}

/// Adds `path` to `list` unless it is the target or already listed.
pub fn push_duplicate(list: &mut Vec<String>, path: &Path, target: &Path) {
    if path == target {
        return;
    }
    let value = path.to_string_lossy().into_owned();
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Best catalog item for an extracted name/year.
///
/// When a library root is given and some matching items live under it, only
/// those are considered. `items` should be in a stable order: ties go to the
/// first one.
pub fn pick_catalog_match<'a, T, F>(
    items: &'a [T],
    name: &str,
    year: Option<i32>,
    root: Option<&Path>,
    key: F,
) -> Option<&'a T>
where
    F: Fn(&T) -> (&str, Option<i32>, Option<&Path>),
{
    let score = |item: &T| {
        let (item_name, item_year, _) = key(item);
        match_score(item_name, item_year, name, year)
    };

    let matching: Vec<&T> = items.iter().filter(|item| score(*item) > 0).collect();
    let under_root: Vec<&T> = match root {
        Some(root) => matching
            .iter()
            .copied()
            .filter(|item| key(*item).2.map(|p| p.starts_with(root)).unwrap_or(false))
            .collect(),
        None => Vec::new(),
    };
    let pool = if under_root.is_empty() {
        matching
    } else {
        under_root
    };

    best_match(&pool, |item| score(*item)).copied()
}

/// Collapses remote candidates that share a name and year, keeping the
/// first one's position and merging provider ids.
pub fn group_candidates(candidates: Vec<RemoteSearchResult>) -> Vec<RemoteSearchResult> {
    let mut groups: Vec<(String, RemoteSearchResult)> = Vec::new();
    for candidate in candidates {
        let key = format!(
            "{}|{}",
            normalize(&candidate.name).to_lowercase(),
            candidate.year.map(|y| y.to_string()).unwrap_or_default()
        );
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => {
                for (provider, id) in candidate.provider_ids {
                    group.provider_ids.entry(provider).or_insert(id);
                }
            }
            None => groups.push((key, candidate)),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Picks the single best remote candidate, or `None` when nothing scores
/// or the top score is shared by several groups.
pub fn auto_detect_candidate(
    candidates: Vec<RemoteSearchResult>,
    name: &str,
    year: Option<i32>,
) -> Option<RemoteSearchResult> {
    let groups = group_candidates(candidates);
    unique_best_match(&groups, |g| match_score(&g.name, g.year, name, year)).cloned()
}

pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// "Name (Year)" or "Name".
pub fn display_name(name: &str, year: Option<i32>) -> String {
    match year {
        Some(y) => format!("{} ({})", name, y),
        None => name.to_string(),
    }
}
