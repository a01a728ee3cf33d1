use serde::{Deserialize, Serialize};

/// Top-level configuration for the organizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoOrganizeConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Minutes between scheduled folder scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_minutes: u64,
    /// How long "organize by id" waits for the background task before
    /// returning to the caller.
    #[serde(default = "default_organize_wait")]
    pub organize_wait_millis: u64,
    /// SQLite database location. Falls back to `default_database_path()`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub episode: EpisodeOrganizeOptions,
    #[serde(default)]
    pub movie: MovieOrganizeOptions,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_scan_interval() -> u64 {
    5
}

fn default_organize_wait() -> u64 {
    2000
}

impl Default for AutoOrganizeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            scan_interval_minutes: default_scan_interval(),
            organize_wait_millis: default_organize_wait(),
            database_path: None,
            episode: EpisodeOrganizeOptions::default(),
            movie: MovieOrganizeOptions::default(),
        }
    }
}

/// Settings shared by the episode and movie organizers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeOptionsCommon {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub watch_locations: Vec<String>,
    /// Files smaller than this are never submitted to the organizer.
    #[serde(default = "default_min_file_size")]
    pub min_file_size_mb: u64,
    #[serde(default = "default_leftover_extensions")]
    pub left_over_file_extensions_to_delete: Vec<String>,
    #[serde(default)]
    pub delete_empty_folders: bool,
    /// Clean leftovers across every watch location, not only folders that
    /// produced a success in the current run.
    #[serde(default)]
    pub extended_clean: bool,
    #[serde(default)]
    pub copy_original_file: bool,
    #[serde(default)]
    pub overwrite_existing: bool,
    /// Ask the metadata resolver for unknown items and create them.
    #[serde(default)]
    pub auto_detect: bool,
    #[serde(default = "default_true")]
    pub queue_library_scan: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_file_size() -> u64 {
    50
}

fn default_leftover_extensions() -> Vec<String> {
    Vec::new()
}

impl Default for OrganizeOptionsCommon {
    fn default() -> Self {
        Self {
            enabled: false,
            watch_locations: Vec::new(),
            min_file_size_mb: default_min_file_size(),
            left_over_file_extensions_to_delete: default_leftover_extensions(),
            delete_empty_folders: false,
            extended_clean: false,
            copy_original_file: false,
            overwrite_existing: false,
            auto_detect: false,
            queue_library_scan: true,
        }
    }
}

impl OrganizeOptionsCommon {
    pub fn min_file_size_bytes(&self) -> u64 {
        self.min_file_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOrganizeOptions {
    #[serde(flatten)]
    pub common: OrganizeOptionsCommon,
    #[serde(default = "default_season_folder_pattern")]
    pub season_folder_pattern: String,
    #[serde(default = "default_season_zero_folder_name")]
    pub season_zero_folder_name: String,
    #[serde(default = "default_episode_name_pattern")]
    pub episode_name_pattern: String,
    #[serde(default = "default_multi_episode_name_pattern")]
    pub multi_episode_name_pattern: String,
    #[serde(default = "default_series_folder_pattern")]
    pub series_folder_pattern: String,
    /// Where folders for newly created series are placed.
    #[serde(default)]
    pub default_series_library_path: Option<String>,
}

fn default_season_folder_pattern() -> String {
    "Season %s".to_string()
}

fn default_season_zero_folder_name() -> String {
    "Season 0".to_string()
}

fn default_episode_name_pattern() -> String {
    "%sn - %sx%0e - %en.%ext".to_string()
}

fn default_multi_episode_name_pattern() -> String {
    "%sn - %sx%0e-x%0ed - %en.%ext".to_string()
}

fn default_series_folder_pattern() -> String {
    "%fn".to_string()
}

impl Default for EpisodeOrganizeOptions {
    fn default() -> Self {
        Self {
            common: OrganizeOptionsCommon::default(),
            season_folder_pattern: default_season_folder_pattern(),
            season_zero_folder_name: default_season_zero_folder_name(),
            episode_name_pattern: default_episode_name_pattern(),
            multi_episode_name_pattern: default_multi_episode_name_pattern(),
            series_folder_pattern: default_series_folder_pattern(),
            default_series_library_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieOrganizeOptions {
    #[serde(flatten)]
    pub common: OrganizeOptionsCommon,
    #[serde(default = "default_movie_pattern")]
    pub movie_pattern: String,
    #[serde(default = "default_movie_folder_pattern")]
    pub movie_folder_pattern: String,
    /// Put each new movie into its own folder under the library path.
    #[serde(default = "default_true")]
    pub create_movie_folder: bool,
    #[serde(default)]
    pub default_movie_library_path: Option<String>,
}

fn default_movie_pattern() -> String {
    "%fn.%ext".to_string()
}

fn default_movie_folder_pattern() -> String {
    "%fn".to_string()
}

impl Default for MovieOrganizeOptions {
    fn default() -> Self {
        Self {
            common: OrganizeOptionsCommon::default(),
            movie_pattern: default_movie_pattern(),
            movie_folder_pattern: default_movie_folder_pattern(),
            create_movie_folder: true,
            default_movie_library_path: None,
        }
    }
}
