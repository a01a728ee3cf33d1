//! Organization log data model.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::hash_path;

/// Stable record id for an original file path.
pub fn result_id_for_path(path: &Path) -> String {
    hash_path(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileOrganizerKind {
    Unknown,
    Movie,
    Episode,
}

impl FileOrganizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Movie => "Movie",
            Self::Episode => "Episode",
        }
    }
}

impl fmt::Display for FileOrganizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileOrganizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Self::Unknown),
            "Movie" => Ok(Self::Movie),
            "Episode" => Ok(Self::Episode),
            other => Err(format!("Unknown organizer kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileSortingStatus {
    Success,
    Failure,
    SkippedExisting,
}

impl FileSortingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::SkippedExisting => "SkippedExisting",
        }
    }
}

impl fmt::Display for FileSortingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileSortingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "Failure" => Ok(Self::Failure),
            "SkippedExisting" => Ok(Self::SkippedExisting),
            other => Err(format!("Unknown sorting status: {}", other)),
        }
    }
}

/// One organize attempt for one original file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResult {
    pub id: String,
    pub original_path: String,
    pub original_file_name: String,
    pub target_path: Option<String>,
    pub file_size: u64,
    pub date: DateTime<Utc>,
    pub kind: FileOrganizerKind,
    pub status: FileSortingStatus,
    pub status_message: Option<String>,
    pub extracted_name: Option<String>,
    pub extracted_year: Option<i32>,
    pub extracted_season_number: Option<u32>,
    pub extracted_episode_number: Option<u32>,
    pub extracted_ending_episode_number: Option<u32>,
    #[serde(default)]
    pub duplicate_paths: Vec<String>,
    /// Filled from the in-progress registry when listing; never stored.
    #[serde(default)]
    pub is_in_progress: bool,
}

impl OrganizationResult {
    pub fn new(original_path: &Path, file_size: u64) -> Self {
        Self {
            id: result_id_for_path(original_path),
            original_path: original_path.to_string_lossy().into_owned(),
            original_file_name: original_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            target_path: None,
            file_size,
            date: Utc::now(),
            kind: FileOrganizerKind::Unknown,
            status: FileSortingStatus::Success,
            status_message: None,
            extracted_name: None,
            extracted_year: None,
            extracted_season_number: None,
            extracted_episode_number: None,
            extracted_ending_episode_number: None,
            duplicate_paths: Vec::new(),
            is_in_progress: false,
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = FileSortingStatus::Failure;
        self.status_message = Some(message.into());
    }

    pub fn skip(&mut self, message: impl Into<String>) {
        self.status = FileSortingStatus::SkippedExisting;
        self.status_message = Some(message.into());
    }

    pub fn succeed(&mut self) {
        self.status = FileSortingStatus::Success;
        self.status_message = None;
    }
}

/// A remembered alias set for one catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartMatchEntry {
    pub id: String,
    pub item_name: String,
    pub display_name: String,
    pub kind: FileOrganizerKind,
    pub match_strings: Vec<String>,
}

impl SmartMatchEntry {
    /// Entry ids are derived from kind and item name, so remembering a
    /// second alias for the same item appends to the existing entry.
    pub fn id_for(kind: FileOrganizerKind, item_name: &str) -> String {
        crate::sanitize::hash_str(&format!("{}|{}", kind.as_str(), item_name))
    }

    pub fn contains(&self, value: &str) -> bool {
        let lower = value.to_lowercase();
        self.match_strings.iter().any(|s| s.to_lowercase() == lower)
    }

    /// Adds `value` unless an equal string (ignoring case) is present.
    pub fn add(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.match_strings.push(value.to_string());
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.match_strings.len();
        let lower = value.to_lowercase();
        self.match_strings.retain(|s| s.to_lowercase() != lower);
        self.match_strings.len() != before
    }
}

/// One page of a paged query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total_record_count: u64,
}
