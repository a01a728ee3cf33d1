//! Episode organizer against fake collaborators and a real temp filesystem.

mod common;

use autoorganize::organize::{
    result_id_for_path, EpisodeOrganizer, FileOrganizerKind, FileSortingStatus,
};
use autoorganize::OrganizationEvent;

use common::{write_file, TestHarness};

#[tokio::test]
async fn test_episode_moved_into_series_folder() {
    let h = TestHarness::new();
    h.catalog
        .add_series("Breaking Bad", Some(2008), Some(&h.tv_dir.join("Breaking Bad")));
    h.resolver.add_episode_title("Breaking Bad", 1, 4, "Pilot");
    let source = h.write_download("Breaking.Bad.S01E04.720p.mkv", 64);

    let mut events = h.context().events.subscribe();
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    let expected = h
        .tv_dir
        .join("Breaking Bad")
        .join("Season 1")
        .join("Breaking Bad - 1x04 - Pilot.mkv");
    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert_eq!(result.kind, FileOrganizerKind::Episode);
    assert_eq!(result.target_path, Some(expected.to_string_lossy().into_owned()));
    assert_eq!(result.extracted_name.as_deref(), Some("Breaking Bad"));
    assert_eq!(result.extracted_season_number, Some(1));
    assert_eq!(result.extracted_episode_number, Some(4));
    assert!(expected.exists());
    assert!(!source.exists());

    let stored = h.store.get_result(&result.id).unwrap().unwrap();
    assert_eq!(stored.status, FileSortingStatus::Success);
    assert!(matches!(events.try_recv(), Ok(OrganizationEvent::ItemAdded(_))));

    assert!(h.monitor.begun().contains(&expected));
    assert!(h.monitor.completed().contains(&expected));
}

#[tokio::test]
async fn test_other_extension_in_same_slot_is_a_duplicate() {
    let h = TestHarness::new();
    let series = h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let season_dir = h.tv_dir.join("Show").join("Season 1");
    let existing = write_file(&season_dir.join("S01E01.mkv"), 10);
    h.catalog.add_episode(&series, 1, 1, &existing);
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.avi", 20);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    let target = season_dir.join("Show - 1x01 - Pilot.avi");
    assert_eq!(result.target_path, Some(target.to_string_lossy().into_owned()));
    assert!(result
        .duplicate_paths
        .contains(&existing.to_string_lossy().into_owned()));
    assert!(!result
        .duplicate_paths
        .contains(&target.to_string_lossy().into_owned()));
    assert_eq!(result.status, FileSortingStatus::SkippedExisting);
    assert!(source.exists());
    assert!(existing.exists());
}

#[tokio::test]
async fn test_overwrite_replaces_duplicate_and_renames_extras() {
    let h = TestHarness::new();
    let series = h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let season_dir = h.tv_dir.join("Show").join("Season 1");
    let existing = write_file(&season_dir.join("Show.S01E01.mkv"), 10);
    write_file(&season_dir.join("Show.S01E01.en.srt"), 3);
    h.catalog.add_episode(&series, 1, 1, &existing);
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.avi", 20);

    let mut options = h.episode_options();
    options.common.overwrite_existing = true;
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert!(season_dir.join("Show - 1x01 - Pilot.avi").exists());
    assert!(!existing.exists());
    assert!(season_dir.join("Show - 1x01 - Pilot.en.srt").exists());
    assert!(!source.exists());
}

#[tokio::test]
async fn test_undeletable_duplicate_keeps_its_extras() {
    let h = TestHarness::new();
    let series = h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let season_dir = h.tv_dir.join("Show").join("Season 1");
    // A directory in the slot cannot be removed as a file.
    let stuck = season_dir.join("Show.S01E01.mkv");
    std::fs::create_dir_all(&stuck).unwrap();
    write_file(&season_dir.join("Show.S01E01.en.srt"), 3);
    h.catalog.add_episode(&series, 1, 1, &stuck);
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.avi", 20);

    let mut options = h.episode_options();
    options.common.overwrite_existing = true;
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert!(season_dir.join("Show - 1x01 - Pilot.avi").exists());
    assert!(stuck.exists());
    assert!(season_dir.join("Show.S01E01.en.srt").exists());
    assert!(!season_dir.join("Show - 1x01 - Pilot.en.srt").exists());
}

#[tokio::test]
async fn test_file_in_progress_elsewhere_is_left_alone() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.mkv", 20);
    let _guard = h
        .context()
        .registry
        .try_acquire(&result_id_for_path(&source))
        .unwrap();

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert!(result
        .status_message
        .as_deref()
        .unwrap()
        .contains("File is currently processed elsewhere"));
    assert!(source.exists());
    assert!(!h.tv_dir.join("Show/Season 1/Show - 1x01 - Pilot.mkv").exists());
    assert!(h.monitor.begun().is_empty());
    assert_eq!(h.store.query_results(0, None).unwrap().total_record_count, 1);
}

#[tokio::test]
async fn test_file_moves_run_off_the_runtime_thread() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.mkv", 20);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    let threads = h.monitor.change_threads();
    assert!(!threads.is_empty());
    assert!(threads.iter().all(|t| *t != std::thread::current().id()));
}

#[tokio::test]
async fn test_repeated_failure_is_stored_once() {
    let h = TestHarness::new();
    let source = h.write_download("Unknown.Show.S01E01.mkv", 20);
    let mut events = h.context().events.subscribe();
    let organizer = EpisodeOrganizer::new(h.context());
    let options = h.episode_options();

    let first = organizer.organize(&source, &options, None).await;
    assert_eq!(first.status, FileSortingStatus::Failure);
    assert!(first
        .status_message
        .as_deref()
        .unwrap()
        .contains("Unable to find series"));
    let stored_first = h.store.get_result(&first.id).unwrap().unwrap();

    let second = organizer.organize(&source, &options, None).await;
    assert_eq!(second.id, first.id);
    let stored_second = h.store.get_result(&first.id).unwrap().unwrap();

    assert_eq!(stored_first, stored_second);
    assert_eq!(h.store.query_results(0, None).unwrap().total_record_count, 1);
    assert!(matches!(events.try_recv(), Ok(OrganizationEvent::ItemAdded(_))));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_auto_detect_creates_series() {
    let h = TestHarness::new();
    h.resolver.add_series_result("Dark", Some(2017), ("tvdb", "334824"));
    h.resolver.add_episode_title("Dark", 1, 2, "Lies");
    let source = h.write_download("Dark.S01E02.mkv", 20);

    let mut options = h.episode_options();
    options.common.auto_detect = true;
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    let expected = h
        .tv_dir
        .join("Dark (2017)")
        .join("Season 1")
        .join("Dark - 1x02 - Lies.mkv");
    assert!(expected.exists());

    let series = h.catalog.all_series();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].provider_ids.get("tvdb").map(String::as_str), Some("334824"));
}

#[tokio::test]
async fn test_ambiguous_auto_detect_fails() {
    let h = TestHarness::new();
    h.resolver.add_series_result("Dark", Some(2017), ("tvdb", "1"));
    h.resolver.add_series_result("Dark", Some(2009), ("tvdb", "2"));
    let source = h.write_download("Dark.S01E02.mkv", 20);

    let mut options = h.episode_options();
    options.common.auto_detect = true;
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert!(result
        .status_message
        .as_deref()
        .unwrap()
        .contains("Unable to auto-detect"));
    assert!(h.catalog.all_series().is_empty());
    assert!(source.exists());
}

#[tokio::test]
async fn test_locked_path_fails() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let source = h.write_download("Show.S01E01.mkv", 20);
    h.monitor.lock_path(&source);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert!(result.status_message.as_deref().unwrap().contains("locked"));
    assert!(source.exists());
}

#[tokio::test]
async fn test_missing_metadata_fails() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    let source = h.write_download("Show.S03E09.mkv", 20);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert!(result
        .status_message
        .as_deref()
        .unwrap()
        .contains("No metadata found"));
    assert_eq!(result.kind, FileOrganizerKind::Episode);
}

#[tokio::test]
async fn test_unparseable_name_fails_extraction() {
    let h = TestHarness::new();
    let source = h.write_download("holiday video.mkv", 20);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert_eq!(result.kind, FileOrganizerKind::Unknown);
    assert!(result
        .status_message
        .as_deref()
        .unwrap()
        .contains("Unable to determine"));
}

#[tokio::test]
async fn test_multi_episode_file_uses_multi_pattern() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 2, "Two");
    let source = h.write_download("Show.S01E02E03.mkv", 20);

    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &h.episode_options(), None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert_eq!(result.extracted_ending_episode_number, Some(3));
    assert!(h
        .tv_dir
        .join("Show/Season 1/Show - 1x02-x03 - Two.mkv")
        .exists());
}

#[tokio::test]
async fn test_season_zero_uses_configured_folder() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 0, 1, "Extra");
    let source = h.write_download("Show.S00E01.mkv", 20);

    let mut options = h.episode_options();
    options.season_zero_folder_name = "Specials".to_string();
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert!(h.tv_dir.join("Show/Specials/Show - 0x01 - Extra.mkv").exists());
}

#[tokio::test]
async fn test_empty_pattern_is_a_recorded_failure() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.mkv", 20);

    let mut options = h.episode_options();
    options.episode_name_pattern = String::new();
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Failure);
    assert!(source.exists());
    assert!(h.store.get_result(&result.id).unwrap().is_some());
}

#[tokio::test]
async fn test_copy_mode_keeps_source() {
    let h = TestHarness::new();
    h.catalog.add_series("Show", None, Some(&h.tv_dir.join("Show")));
    h.resolver.add_episode_title("Show", 1, 1, "Pilot");
    let source = h.write_download("Show.S01E01.mkv", 20);

    let mut options = h.episode_options();
    options.common.copy_original_file = true;
    let organizer = EpisodeOrganizer::new(h.context());
    let result = organizer.organize(&source, &options, None).await;

    assert_eq!(result.status, FileSortingStatus::Success, "{:?}", result.status_message);
    assert!(source.exists());
    assert!(h.tv_dir.join("Show/Season 1/Show - 1x01 - Pilot.mkv").exists());

    // A second pass finds the copy already in place.
    let again = organizer.organize(&source, &options, None).await;
    assert_eq!(again.status, FileSortingStatus::SkippedExisting);
    assert!(again.status_message.as_deref().unwrap().contains("already copied"));
}
