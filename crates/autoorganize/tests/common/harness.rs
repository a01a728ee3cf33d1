//! Isolated environment for organizer tests.
//!
//! Every harness owns a temp directory with a watch folder and two library
//! roots, an in-memory result store and fresh fakes.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use autoorganize::config::{
    AutoOrganizeConfig, EpisodeOrganizeOptions, MovieOrganizeOptions, OrganizeOptionsCommon,
};
use autoorganize::naming::RegexNameParser;
use autoorganize::{OrganizationService, OrganizerContext, ResultStore};

use super::fakes::{FakeCatalog, FakeMonitor, FakeResolver};

pub struct TestHarness {
    temp_dir: TempDir,
    pub watch_dir: PathBuf,
    pub tv_dir: PathBuf,
    pub movie_dir: PathBuf,
    pub catalog: Arc<FakeCatalog>,
    pub resolver: Arc<FakeResolver>,
    pub monitor: Arc<FakeMonitor>,
    pub store: ResultStore,
    ctx: OrganizerContext,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let watch_dir = base.join("downloads");
        let tv_dir = base.join("tv");
        let movie_dir = base.join("movies");
        for dir in [&watch_dir, &tv_dir, &movie_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create test dir");
        }

        let catalog = Arc::new(FakeCatalog::default());
        catalog.add_library_path(&tv_dir);
        catalog.add_library_path(&movie_dir);
        let resolver = Arc::new(FakeResolver::default());
        let monitor = Arc::new(FakeMonitor::default());
        let store = ResultStore::open_in_memory().expect("Failed to open in-memory store");

        let ctx = OrganizerContext::new(
            catalog.clone(),
            resolver.clone(),
            monitor.clone(),
            Arc::new(RegexNameParser::new()),
            store.clone(),
        );

        Self {
            temp_dir,
            watch_dir,
            tv_dir,
            movie_dir,
            catalog,
            resolver,
            monitor,
            store,
            ctx,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn context(&self) -> OrganizerContext {
        self.ctx.clone()
    }

    pub fn service(&self, config: AutoOrganizeConfig) -> OrganizationService {
        OrganizationService::new(config, self.ctx.clone())
    }

    /// Writes a file of `size` bytes below the watch folder.
    pub fn write_download(&self, relative: &str, size: usize) -> PathBuf {
        write_file(&self.watch_dir.join(relative), size)
    }

    pub fn common_options(&self) -> OrganizeOptionsCommon {
        OrganizeOptionsCommon {
            enabled: true,
            watch_locations: vec![self.watch_dir.to_string_lossy().into_owned()],
            min_file_size_mb: 0,
            ..Default::default()
        }
    }

    pub fn episode_options(&self) -> EpisodeOrganizeOptions {
        EpisodeOrganizeOptions {
            common: self.common_options(),
            default_series_library_path: Some(self.tv_dir.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    pub fn movie_options(&self) -> MovieOrganizeOptions {
        MovieOrganizeOptions {
            common: self.common_options(),
            default_movie_library_path: Some(self.movie_dir.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    /// Episodes enabled, movies disabled.
    pub fn episode_config(&self) -> AutoOrganizeConfig {
        AutoOrganizeConfig {
            episode: self.episode_options(),
            movie: MovieOrganizeOptions::default(),
            ..Default::default()
        }
    }

    pub fn movie_config(&self) -> AutoOrganizeConfig {
        AutoOrganizeConfig {
            episode: EpisodeOrganizeOptions::default(),
            movie: self.movie_options(),
            ..Default::default()
        }
    }
}

pub fn write_file(path: &Path, size: usize) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, vec![b'x'; size]).expect("Failed to write file");
    path.to_path_buf()
}
