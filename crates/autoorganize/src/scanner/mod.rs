//! Watch-folder scanning: find eligible files, organize them one by one,
//! clean up afterwards.

pub mod cleanup;
pub mod folder_scanner;
pub mod scheduler;

pub use folder_scanner::{
    collect_files, eligible_watch_locations, CancelFlag, FolderScanner, NoopProgress,
    ScanProgress, ScanSummary,
};
pub use scheduler::ScanScheduler;
