//! One pass over the watch locations.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use walkdir::WalkDir;

use crate::config::{AutoOrganizeConfig, OrganizeOptionsCommon};
use crate::library::FileNameParser;
use crate::organize::{
    EpisodeOrganizer, FileOrganizerKind, FileSortingStatus, MovieOrganizer, OrganizationResult,
    OrganizerContext,
};
use crate::scanner::cleanup;

/// Receives scan progress in percent, 0 to 100.
pub trait ScanProgress: Send + Sync {
    fn report(&self, percent: f64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ScanProgress for NoopProgress {
    fn report(&self, _percent: f64) {}
}

/// Cooperative cancellation, checked between files.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub files_found: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub leftovers_deleted: usize,
    pub folders_removed: usize,
    pub cancelled: bool,
    pub library_scan_queued: bool,
}

impl ScanSummary {
    fn record(&mut self, result: &OrganizationResult) {
        self.processed += 1;
        match result.status {
            FileSortingStatus::Success => self.succeeded += 1,
            FileSortingStatus::Failure => self.failed += 1,
            FileSortingStatus::SkippedExisting => self.skipped += 1,
        }
    }
}

#[derive(Clone)]
pub struct FolderScanner {
    ctx: OrganizerContext,
    episodes: EpisodeOrganizer,
    movies: MovieOrganizer,
}

impl FolderScanner {
    pub fn new(ctx: OrganizerContext) -> Self {
        Self {
            episodes: EpisodeOrganizer::new(ctx.clone()),
            movies: MovieOrganizer::new(ctx.clone()),
            ctx,
        }
    }

    /// Organizes every eligible file of every enabled kind, then cleans up.
    /// Files are handled one at a time.
    pub async fn run(
        &self,
        config: &AutoOrganizeConfig,
        progress: &dyn ScanProgress,
        cancel: &CancelFlag,
    ) -> ScanSummary {
        let span = info_span!("folder_scan");
        self.run_inner(config, progress, cancel).instrument(span).await
    }

    async fn run_inner(
        &self,
        config: &AutoOrganizeConfig,
        progress: &dyn ScanProgress,
        cancel: &CancelFlag,
    ) -> ScanSummary {
        let mut summary = ScanSummary::default();
        progress.report(0.0);

        let library_paths = match self.ctx.catalog.library_paths().await {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "Could not list library paths");
                Vec::new()
            }
        };

        let kinds: Vec<(FileOrganizerKind, &OrganizeOptionsCommon)> = [
            (FileOrganizerKind::Episode, &config.episode.common),
            (FileOrganizerKind::Movie, &config.movie.common),
        ]
        .into_iter()
        .filter(|(_, common)| common.enabled)
        .collect();

        let share = 100.0 / kinds.len().max(1) as f64;
        let mut queue_scan = false;

        for (index, (kind, common)) in kinds.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let roots = eligible_watch_locations(&common.watch_locations, &library_paths);
            let files = collect_files(&roots, common.min_file_size_bytes(), self.ctx.parser.as_ref());
            info!(kind = %kind, files = files.len(), "Found files to organize");
            summary.files_found += files.len();

            let base = share * index as f64;
            let mut touched: BTreeSet<PathBuf> = BTreeSet::new();

            for (done, file) in files.iter().enumerate() {
                if cancel.is_cancelled() {
                    info!("Scan cancelled");
                    summary.cancelled = true;
                    break;
                }

                let result = match kind {
                    FileOrganizerKind::Episode => {
                        self.episodes.organize(file, &config.episode, None).await
                    }
                    _ => self.movies.organize(file, &config.movie, None).await,
                };
                if result.status == FileSortingStatus::Success {
                    if let Some(parent) = file.parent() {
                        touched.insert(parent.to_path_buf());
                    }
                }
                summary.record(&result);

                progress.report(base + share * (done + 1) as f64 / files.len() as f64);
            }

            if summary.cancelled {
                break;
            }

            self.clean(common, &roots, &touched, &mut summary);
            if common.queue_library_scan && !touched.is_empty() {
                queue_scan = true;
            }
            progress.report(base + share);
        }

        if queue_scan && !summary.cancelled {
            if self.ctx.catalog.is_library_scan_running() {
                debug!("Library scan already running, not queueing another");
            } else {
                match self.ctx.catalog.queue_library_scan().await {
                    Ok(()) => summary.library_scan_queued = true,
                    Err(e) => warn!(error = %e, "Could not queue library scan"),
                }
            }
        }

        if !summary.cancelled {
            progress.report(100.0);
        }
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Folder scan finished"
        );
        summary
    }

    fn clean(
        &self,
        common: &OrganizeOptionsCommon,
        roots: &[PathBuf],
        touched: &BTreeSet<PathBuf>,
        summary: &mut ScanSummary,
    ) {
        let extensions = &common.left_over_file_extensions_to_delete;
        summary.leftovers_deleted += if common.extended_clean {
            cleanup::delete_leftovers_recursive(roots, extensions)
        } else {
            let folders: Vec<PathBuf> = touched.iter().cloned().collect();
            cleanup::delete_leftovers_in(&folders, extensions)
        };

        if common.delete_empty_folders {
            for root in roots {
                summary.folders_removed += cleanup::remove_empty_folders(root);
            }
        }
    }
}

/// Watch locations that exist and are not inside a library folder.
pub fn eligible_watch_locations(watch_locations: &[String], library_paths: &[PathBuf]) -> Vec<PathBuf> {
    watch_locations
        .iter()
        .map(PathBuf::from)
        .filter(|watch| {
            let managed = library_paths.iter().any(|lib| watch.starts_with(lib));
            if managed {
                warn!(
                    folder = %watch.display(),
                    "Watch location is inside a library folder, skipping"
                );
            }
            !managed
        })
        .filter(|watch| watch.is_dir())
        .collect()
}

/// Video files at or above `min_size` under `roots`, oldest first.
pub fn collect_files(roots: &[PathBuf], min_size: u64, parser: &dyn FileNameParser) -> Vec<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !parser.is_video_file(path) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.len() < min_size {
                debug!(file = %path.display(), size = metadata.len(), "File below minimum size");
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((created, path.to_path_buf()));
        }
    }
    files.sort();
    files.into_iter().map(|(_, path)| path).collect()
}
