//! The organize engine: turns one downloaded file into a logged outcome.

pub mod episode;
pub mod movie;
pub mod registry;
pub mod request;
pub mod result;
pub mod shared;

pub use episode::EpisodeOrganizer;
pub use movie::MovieOrganizer;
pub use registry::{InProgressGuard, InProgressRegistry};
pub use request::{EpisodeCorrection, ItemSelection, MovieCorrection, NewItem};
pub use result::{
    result_id_for_path, FileOrganizerKind, FileSortingStatus, OrganizationResult, QueryResult,
    SmartMatchEntry,
};
pub use shared::{CreationLocks, OrganizerContext};
