//! Narrow interfaces to the host media server.
//!
//! The organizer never sees the host's domain model. It only asks a catalog
//! for series/movies/episodes, a metadata resolver for remote candidates,
//! a monitor for filesystem locking and change notifications, and a parser
//! for filename heuristics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Provider name → provider id, e.g. `"tvdb" → "81189"`.
pub type ProviderIds = BTreeMap<String, String>;

/// True when both maps carry the same id for at least one provider.
pub fn shares_provider_id(a: &ProviderIds, b: &ProviderIds) -> bool {
    a.iter()
        .any(|(provider, id)| !id.is_empty() && b.get(provider) == Some(id))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub name: String,
    pub year: Option<i32>,
    /// Series folder on disk, if the catalog has one.
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub series_id: String,
    pub season_number: u32,
    pub index_number: u32,
    pub ending_index_number: Option<u32>,
    pub name: Option<String>,
    pub path: PathBuf,
}

impl Episode {
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Same season, start and end index. A missing end equals the start.
    pub fn occupies_slot(&self, season: u32, episode: u32, ending: Option<u32>) -> bool {
        self.season_number == season
            && self.index_number == episode
            && self.ending_index_number.unwrap_or(self.index_number) == ending.unwrap_or(episode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub name: String,
    pub year: Option<i32>,
    /// Path of the movie file.
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

/// Minimal description of a series the catalog should create.
#[derive(Debug, Clone)]
pub struct NewSeries {
    pub name: String,
    pub year: Option<i32>,
    pub provider_ids: ProviderIds,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub name: String,
    pub year: Option<i32>,
    pub provider_ids: ProviderIds,
    pub path: PathBuf,
}

/// A candidate returned by a remote metadata search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSearchResult {
    pub name: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub name: Option<String>,
    pub season_number: u32,
    pub index_number: u32,
    pub ending_index_number: Option<u32>,
}

/// Values recovered from an episode filename.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpisodeInfo {
    pub name: String,
    pub year: Option<i32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub ending_episode: Option<u32>,
}

/// Values recovered from a movie filename.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovieInfo {
    pub name: String,
    pub year: Option<i32>,
}

#[async_trait]
pub trait LibraryCatalog: Send + Sync {
    async fn series(&self) -> Result<Vec<Series>, LibraryError>;

    async fn movies(&self) -> Result<Vec<Movie>, LibraryError>;

    async fn get_series(&self, id: &str) -> Result<Option<Series>, LibraryError>;

    async fn get_movie(&self, id: &str) -> Result<Option<Movie>, LibraryError>;

    async fn episodes(&self, series_id: &str) -> Result<Vec<Episode>, LibraryError>;

    /// Persists a new series and refreshes its metadata.
    async fn create_series(&self, series: NewSeries) -> Result<Series, LibraryError>;

    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, LibraryError>;

    /// Root folders of every library the catalog manages.
    async fn library_paths(&self) -> Result<Vec<PathBuf>, LibraryError>;

    async fn queue_library_scan(&self) -> Result<(), LibraryError>;

    fn is_library_scan_running(&self) -> bool;
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn search_series(
        &self,
        name: &str,
        year: Option<i32>,
    ) -> Result<Vec<RemoteSearchResult>, LibraryError>;

    async fn search_movie(
        &self,
        name: &str,
        year: Option<i32>,
    ) -> Result<Vec<RemoteSearchResult>, LibraryError>;

    async fn episode_metadata(
        &self,
        series: &Series,
        season: u32,
        episode: u32,
        ending_episode: Option<u32>,
    ) -> Result<Option<EpisodeMetadata>, LibraryError>;
}

/// The host's real-time filesystem watcher.
pub trait LibraryMonitor: Send + Sync {
    fn is_path_locked(&self, path: &Path) -> bool;

    fn report_file_system_change_beginning(&self, path: &Path);

    /// `refresh` asks the watcher to rescan the path from disk.
    fn report_file_system_change_complete(&self, path: &Path, refresh: bool);
}

pub trait FileNameParser: Send + Sync {
    fn parse_episode(&self, path: &Path) -> Option<EpisodeInfo>;

    fn parse_movie(&self, path: &Path) -> Option<MovieInfo>;

    fn is_video_file(&self, path: &Path) -> bool;
}

/// A monitor for hosts without a real-time watcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl LibraryMonitor for NoopMonitor {
    fn is_path_locked(&self, _path: &Path) -> bool {
        false
    }

    fn report_file_system_change_beginning(&self, _path: &Path) {}

    fn report_file_system_change_complete(&self, _path: &Path, _refresh: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pairs: &[(&str, &str)]) -> ProviderIds {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_shares_provider_id() {
        let a = ids(&[("tvdb", "1"), ("imdb", "tt1")]);
        assert!(shares_provider_id(&a, &ids(&[("imdb", "tt1")])));
        assert!(!shares_provider_id(&a, &ids(&[("imdb", "tt2")])));
        assert!(!shares_provider_id(&a, &ProviderIds::new()));
        assert!(!shares_provider_id(&ids(&[("tvdb", "")]), &ids(&[("tvdb", "")])));
    }

    #[test]
    fn test_episode_slot() {
        let episode = Episode {
            id: "e".to_string(),
            series_id: "s".to_string(),
            season_number: 1,
            index_number: 2,
            ending_index_number: None,
            name: None,
            path: PathBuf::from("/tv/Show/Season 1/Show - 1x02.MKV"),
        };
        assert!(episode.occupies_slot(1, 2, None));
        assert!(episode.occupies_slot(1, 2, Some(2)));
        assert!(!episode.occupies_slot(1, 2, Some(3)));
        assert!(!episode.occupies_slot(2, 2, None));
        assert_eq!(episode.extension().as_deref(), Some("mkv"));
    }
}
