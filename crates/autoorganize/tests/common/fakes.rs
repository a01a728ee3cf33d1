//! In-memory stand-ins for the host collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

use async_trait::async_trait;

use autoorganize::library::{
    Episode, EpisodeMetadata, LibraryCatalog, LibraryMonitor, MetadataResolver, Movie, NewMovie,
    NewSeries, ProviderIds, RemoteSearchResult, Series,
};
use autoorganize::LibraryError;

#[derive(Default)]
struct CatalogState {
    series: Vec<Series>,
    movies: Vec<Movie>,
    episodes: Vec<Episode>,
    library_paths: Vec<PathBuf>,
    next_id: usize,
}

#[derive(Default)]
pub struct FakeCatalog {
    state: Mutex<CatalogState>,
    pub scans_queued: AtomicUsize,
    pub scan_running: AtomicBool,
}

impl FakeCatalog {
    fn next_id(state: &mut CatalogState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{:03}", prefix, state.next_id)
    }

    pub fn add_series(&self, name: &str, year: Option<i32>, path: Option<&Path>) -> Series {
        let mut state = self.state.lock().unwrap();
        let series = Series {
            id: Self::next_id(&mut state, "series"),
            name: name.to_string(),
            year,
            path: path.map(Path::to_path_buf),
            provider_ids: ProviderIds::new(),
        };
        state.series.push(series.clone());
        series
    }

    pub fn add_movie(&self, name: &str, year: Option<i32>, path: Option<&Path>) -> Movie {
        let mut state = self.state.lock().unwrap();
        let movie = Movie {
            id: Self::next_id(&mut state, "movie"),
            name: name.to_string(),
            year,
            path: path.map(Path::to_path_buf),
            provider_ids: ProviderIds::new(),
        };
        state.movies.push(movie.clone());
        movie
    }

    pub fn add_episode(&self, series: &Series, season: u32, episode: u32, path: &Path) -> Episode {
        let mut state = self.state.lock().unwrap();
        let episode = Episode {
            id: Self::next_id(&mut state, "episode"),
            series_id: series.id.clone(),
            season_number: season,
            index_number: episode,
            ending_index_number: None,
            name: None,
            path: path.to_path_buf(),
        };
        state.episodes.push(episode.clone());
        episode
    }

    pub fn add_library_path(&self, path: &Path) {
        self.state.lock().unwrap().library_paths.push(path.to_path_buf());
    }

    pub fn all_series(&self) -> Vec<Series> {
        self.state.lock().unwrap().series.clone()
    }

    pub fn all_movies(&self) -> Vec<Movie> {
        self.state.lock().unwrap().movies.clone()
    }
}

#[async_trait]
impl LibraryCatalog for FakeCatalog {
    async fn series(&self) -> Result<Vec<Series>, LibraryError> {
        Ok(self.all_series())
    }

    async fn movies(&self) -> Result<Vec<Movie>, LibraryError> {
        Ok(self.all_movies())
    }

    async fn get_series(&self, id: &str) -> Result<Option<Series>, LibraryError> {
        Ok(self.all_series().into_iter().find(|s| s.id == id))
    }

    async fn get_movie(&self, id: &str) -> Result<Option<Movie>, LibraryError> {
        Ok(self.all_movies().into_iter().find(|m| m.id == id))
    }

    async fn episodes(&self, series_id: &str) -> Result<Vec<Episode>, LibraryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .episodes
            .iter()
            .filter(|e| e.series_id == series_id)
            .cloned()
            .collect())
    }

    async fn create_series(&self, new: NewSeries) -> Result<Series, LibraryError> {
        let mut state = self.state.lock().unwrap();
        let series = Series {
            id: Self::next_id(&mut state, "series"),
            name: new.name,
            year: new.year,
            path: Some(new.path),
            provider_ids: new.provider_ids,
        };
        state.series.push(series.clone());
        Ok(series)
    }

    async fn create_movie(&self, new: NewMovie) -> Result<Movie, LibraryError> {
        let mut state = self.state.lock().unwrap();
        let movie = Movie {
            id: Self::next_id(&mut state, "movie"),
            name: new.name,
            year: new.year,
            path: Some(new.path),
            provider_ids: new.provider_ids,
        };
        state.movies.push(movie.clone());
        Ok(movie)
    }

    async fn library_paths(&self) -> Result<Vec<PathBuf>, LibraryError> {
        Ok(self.state.lock().unwrap().library_paths.clone())
    }

    async fn queue_library_scan(&self) -> Result<(), LibraryError> {
        self.scans_queued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_library_scan_running(&self) -> bool {
        self.scan_running.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeResolver {
    series_results: Mutex<Vec<RemoteSearchResult>>,
    movie_results: Mutex<Vec<RemoteSearchResult>>,
    episode_titles: Mutex<HashMap<(String, u32, u32), String>>,
}

impl FakeResolver {
    pub fn add_series_result(&self, name: &str, year: Option<i32>, provider: (&str, &str)) {
        self.series_results.lock().unwrap().push(remote(name, year, provider));
    }

    pub fn add_movie_result(&self, name: &str, year: Option<i32>, provider: (&str, &str)) {
        self.movie_results.lock().unwrap().push(remote(name, year, provider));
    }

    pub fn add_episode_title(&self, series: &str, season: u32, episode: u32, title: &str) {
        self.episode_titles
            .lock()
            .unwrap()
            .insert((series.to_string(), season, episode), title.to_string());
    }
}

fn remote(name: &str, year: Option<i32>, provider: (&str, &str)) -> RemoteSearchResult {
    let mut provider_ids = ProviderIds::new();
    provider_ids.insert(provider.0.to_string(), provider.1.to_string());
    RemoteSearchResult {
        name: name.to_string(),
        year,
        provider_ids,
    }
}

#[async_trait]
impl MetadataResolver for FakeResolver {
    async fn search_series(
        &self,
        _name: &str,
        _year: Option<i32>,
    ) -> Result<Vec<RemoteSearchResult>, LibraryError> {
        Ok(self.series_results.lock().unwrap().clone())
    }

    async fn search_movie(
        &self,
        _name: &str,
        _year: Option<i32>,
    ) -> Result<Vec<RemoteSearchResult>, LibraryError> {
        Ok(self.movie_results.lock().unwrap().clone())
    }

    async fn episode_metadata(
        &self,
        series: &Series,
        season: u32,
        episode: u32,
        ending_episode: Option<u32>,
    ) -> Result<Option<EpisodeMetadata>, LibraryError> {
        let titles = self.episode_titles.lock().unwrap();
        Ok(titles
            .get(&(series.name.clone(), season, episode))
            .map(|title| EpisodeMetadata {
                name: Some(title.clone()),
                season_number: season,
                index_number: episode,
                ending_index_number: ending_episode,
            }))
    }
}

#[derive(Default)]
pub struct FakeMonitor {
    locked: Mutex<HashSet<PathBuf>>,
    begun: Mutex<Vec<PathBuf>>,
    completed: Mutex<Vec<PathBuf>>,
    change_threads: Mutex<Vec<ThreadId>>,
}

impl FakeMonitor {
    pub fn lock_path(&self, path: &Path) {
        self.locked.lock().unwrap().insert(path.to_path_buf());
    }

    pub fn begun(&self) -> Vec<PathBuf> {
        self.begun.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap().clone()
    }

    /// Threads that announced a filesystem change, in order.
    pub fn change_threads(&self) -> Vec<ThreadId> {
        self.change_threads.lock().unwrap().clone()
    }
}

impl LibraryMonitor for FakeMonitor {
    fn is_path_locked(&self, path: &Path) -> bool {
        self.locked.lock().unwrap().contains(path)
    }

    fn report_file_system_change_beginning(&self, path: &Path) {
        self.begun.lock().unwrap().push(path.to_path_buf());
        self.change_threads.lock().unwrap().push(std::thread::current().id());
    }

    fn report_file_system_change_complete(&self, path: &Path, _refresh: bool) {
        self.completed.lock().unwrap().push(path.to_path_buf());
    }
}
