pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod library;
pub mod logging;
pub mod naming;
pub mod organize;
pub mod sanitize;
pub mod scanner;
pub mod service;
pub mod storage;

pub use config::{load_config, AutoOrganizeConfig, SharedConfig};
pub use db::{Database, ResultStore};
pub use error::{
    AutoOrganizeError, ConfigError, LibraryError, LoggingError, OrganizeError, Result,
    ServiceError, StorageError,
};
pub use events::{EventBroadcaster, OrganizationEvent};
pub use logging::{init_logging, LogFormat};
pub use organize::{
    EpisodeCorrection, EpisodeOrganizer, FileOrganizerKind, FileSortingStatus, MovieCorrection,
    MovieOrganizer, OrganizationResult, OrganizerContext, SmartMatchEntry,
};
pub use scanner::{CancelFlag, FolderScanner, ScanScheduler, ScanSummary};
pub use service::OrganizationService;
