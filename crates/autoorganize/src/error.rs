use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoOrganizeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file from '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete '{path}': {source}")]
    DeleteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename '{from}' to '{to}': {source}")]
    RenameFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by one of the host collaborators (catalog, metadata
/// resolver, monitor).
#[derive(Error, Debug, Clone)]
pub enum LibraryError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Catalog operation failed: {0}")]
    Catalog(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),
}

/// Outcome taxonomy of a single organize attempt.
///
/// The rendered message is what ends up in `StatusMessage`; none of these
/// ever escape the engine as a hard error.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Path is locked by other processes. Please try again later.")]
    PathLocked,

    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    IdentityResolution(String),

    #[error("{0}")]
    MetadataNotFound(String),

    #[error("File is currently processed elsewhere. Please try again later.")]
    ConcurrencyConflict,

    #[error("{0}")]
    Filesystem(#[from] StorageError),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Collaborator(#[from] LibraryError),

    #[error("File operation did not complete: {0}")]
    BackgroundTask(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No organization result with id '{0}'")]
    ResultNotFound(String),

    #[error("No target path available for result '{0}'")]
    NoTargetPath(String),

    #[error("Cannot organize a result of unknown kind: {0}")]
    UnknownKind(String),

    #[error("No smart match entry with id '{0}'")]
    SmartMatchNotFound(String),

    #[error("Organization task failed: {0}")]
    TaskFailed(String),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(String),

    #[error("A global log bridge is already installed: {0}")]
    LogBridge(String),
}

pub type Result<T> = std::result::Result<T, AutoOrganizeError>;
