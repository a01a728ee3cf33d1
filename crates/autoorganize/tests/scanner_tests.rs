//! Folder scans end to end.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use autoorganize::organize::FileSortingStatus;
use autoorganize::scanner::{CancelFlag, FolderScanner, NoopProgress, ScanProgress, ScanScheduler};

use common::{write_file, TestHarness};

#[derive(Default)]
struct RecordingProgress {
    reports: Mutex<Vec<f64>>,
}

impl RecordingProgress {
    fn reports(&self) -> Vec<f64> {
        self.reports.lock().unwrap().clone()
    }
}

impl ScanProgress for RecordingProgress {
    fn report(&self, percent: f64) {
        self.reports.lock().unwrap().push(percent);
    }
}

#[tokio::test]
async fn test_empty_watch_folder_completes() {
    let h = TestHarness::new();
    let scanner = FolderScanner::new(h.context());
    let progress = RecordingProgress::default();

    let summary = scanner
        .run(&h.episode_config(), &progress, &CancelFlag::new())
        .await;

    assert_eq!(summary.files_found, 0);
    assert_eq!(summary.processed, 0);
    assert!(!summary.cancelled);
    assert_eq!(progress.reports().last().copied(), Some(100.0));
    assert_eq!(h.store.query_results(0, None).unwrap().total_record_count, 0);
}

#[tokio::test]
async fn test_small_files_are_never_submitted() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let source = h.write_download("Show.S01E01.mkv", 10);

    let mut config = h.episode_config();
    config.episode.common.min_file_size_mb = 1;
    let scanner = FolderScanner::new(h.context());
    let summary = scanner.run(&config, &NoopProgress, &CancelFlag::new()).await;

    assert_eq!(summary.files_found, 0);
    assert_eq!(h.store.query_results(0, None).unwrap().total_record_count, 0);
    assert!(source.exists());
}

#[tokio::test]
async fn test_scan_organizes_and_cleans_up() {
    let h = TestHarness::new();
    h.catalog.add_series("Breaking Bad", Some(2008), Some(&h.tv_dir.join("Breaking Bad")));
    h.resolver.add_episode_title("Breaking Bad", 1, 4, "Cancer Man");
    let release = h.watch_dir.join("Breaking.Bad.S01E04.720p");
    write_file(&release.join("Breaking.Bad.S01E04.720p.mkv"), 64);
    write_file(&release.join("release.NFO"), 4);
    write_file(&h.watch_dir.join("unrelated/notes.nfo"), 4);

    let mut config = h.episode_config();
    config.episode.common.left_over_file_extensions_to_delete = vec![".nfo".to_string()];
    config.episode.common.delete_empty_folders = true;

    let scanner = FolderScanner::new(h.context());
    let progress = RecordingProgress::default();
    let summary = scanner.run(&config, &progress, &CancelFlag::new()).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.leftovers_deleted, 1);
    assert!(summary.library_scan_queued);
    assert_eq!(h.catalog.scans_queued.load(Ordering::SeqCst), 1);

    assert!(h
        .tv_dir
        .join("Breaking Bad/Season 1/Breaking Bad - 1x04 - Cancer Man.mkv")
        .exists());
    // Normal clean only touches folders that produced a success.
    assert!(!release.exists());
    assert!(h.watch_dir.join("unrelated/notes.nfo").exists());
    assert!(h.watch_dir.exists());

    let reports = progress.reports();
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(reports.last().copied(), Some(100.0));
}

#[tokio::test]
async fn test_extended_clean_covers_all_folders() {
    let h = TestHarness::new();
    write_file(&h.watch_dir.join("a/notes.nfo"), 4);
    write_file(&h.watch_dir.join("b/c/more.NFO"), 4);

    let mut config = h.episode_config();
    config.episode.common.left_over_file_extensions_to_delete = vec!["nfo".to_string()];
    config.episode.common.extended_clean = true;

    let scanner = FolderScanner::new(h.context());
    let summary = scanner.run(&config, &NoopProgress, &CancelFlag::new()).await;

    assert_eq!(summary.leftovers_deleted, 2);
    assert!(!summary.library_scan_queued);
}

#[tokio::test]
async fn test_running_library_scan_is_not_requeued() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    h.write_download("Show.S01E01.mkv", 20);
    h.catalog.scan_running.store(true, Ordering::SeqCst);

    let scanner = FolderScanner::new(h.context());
    let summary = scanner
        .run(&h.episode_config(), &NoopProgress, &CancelFlag::new())
        .await;

    assert_eq!(summary.succeeded, 1);
    assert!(!summary.library_scan_queued);
    assert_eq!(h.catalog.scans_queued.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_watch_folder_inside_library_is_skipped() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let inside = write_file(&h.tv_dir.join("incoming/Show.S01E01.mkv"), 20);

    let mut config = h.episode_config();
    config.episode.common.watch_locations = vec![h.tv_dir.join("incoming").to_string_lossy().into_owned()];

    let scanner = FolderScanner::new(h.context());
    let summary = scanner.run(&config, &NoopProgress, &CancelFlag::new()).await;

    assert_eq!(summary.files_found, 0);
    assert!(inside.exists());
}

#[tokio::test]
async fn test_cancelled_scan_processes_nothing() {
    let h = TestHarness::new();
    h.write_download("Show.S01E01.mkv", 20);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let scanner = FolderScanner::new(h.context());
    let summary = scanner.run(&h.episode_config(), &NoopProgress, &cancel).await;

    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert_eq!(h.store.query_results(0, None).unwrap().total_record_count, 0);
}

#[tokio::test]
async fn test_disabled_kinds_are_not_scanned() {
    let h = TestHarness::new();
    h.write_download("Show.S01E01.mkv", 20);

    let mut config = h.episode_config();
    config.episode.common.enabled = false;
    let scanner = FolderScanner::new(h.context());
    let summary = scanner.run(&config, &NoopProgress, &CancelFlag::new()).await;

    assert_eq!(summary.files_found, 0);
    assert!(!summary.cancelled);
}

#[test]
fn test_scheduler_runs_triggered_scan_and_stops() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    h.write_download("Show.S01E01.mkv", 20);

    let service = h.service(h.episode_config());
    let scheduler = ScanScheduler::new(
        service.scanner(),
        service.shared_config(),
        Arc::new(NoopProgress),
    )
    .with_interval(Duration::from_secs(3600));
    let handle = scheduler.start().unwrap();

    scheduler.trigger();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut organized = false;
    while Instant::now() < deadline {
        let page = h.store.query_results(0, None).unwrap();
        if page.items.iter().any(|r| r.status == FileSortingStatus::Success) {
            organized = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    scheduler.stop();
    handle.join().expect("scheduler thread panicked");
    assert!(organized);
    assert!(h.tv_dir.join("Show/Season 1/Show - 1x01 - Pilot.mkv").exists());
}

#[test]
fn test_scheduler_starts_only_once() {
    let h = TestHarness::new();
    let service = h.service(h.episode_config());
    let scheduler = ScanScheduler::new(
        service.scanner(),
        service.shared_config(),
        Arc::new(NoopProgress),
    )
    .with_interval(Duration::from_secs(3600));

    let handle = scheduler.start().unwrap();
    let err = scheduler.start().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

    scheduler.stop();
    handle.join().expect("scheduler thread panicked");
}
