//! The organizer as the API layer sees it.
//!
//! Constructed once at startup and handed to the scheduler and request
//! handlers. Holds the live configuration and the shared organizer state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{database_path, validate_config, AutoOrganizeConfig, SharedConfig};
use crate::db::{Database, ResultStore};
use crate::error::{AutoOrganizeError, ConfigError, ServiceError};
use crate::events::{EventBroadcaster, OrganizationEvent};
use crate::library::{FileNameParser, LibraryCatalog, LibraryMonitor, MetadataResolver};
use crate::organize::{
    EpisodeCorrection, EpisodeOrganizer, FileOrganizerKind, MovieCorrection, MovieOrganizer,
    OrganizationResult, OrganizerContext, QueryResult, SmartMatchEntry,
};
use crate::sanitize::redact_path;
use crate::scanner::{CancelFlag, FolderScanner, ScanProgress, ScanSummary};
use crate::storage;

#[derive(Clone)]
pub struct OrganizationService {
    config: SharedConfig,
    ctx: OrganizerContext,
    episodes: EpisodeOrganizer,
    movies: MovieOrganizer,
    scanner: FolderScanner,
}

impl OrganizationService {
    pub fn new(config: AutoOrganizeConfig, ctx: OrganizerContext) -> Self {
        Self {
            config: SharedConfig::new(config),
            episodes: EpisodeOrganizer::new(ctx.clone()),
            movies: MovieOrganizer::new(ctx.clone()),
            scanner: FolderScanner::new(ctx.clone()),
            ctx,
        }
    }

    /// Opens the result database named by the config (or the platform
    /// default) and wires the collaborators together.
    pub fn open(
        config: AutoOrganizeConfig,
        catalog: Arc<dyn LibraryCatalog>,
        resolver: Arc<dyn MetadataResolver>,
        monitor: Arc<dyn LibraryMonitor>,
        parser: Arc<dyn FileNameParser>,
    ) -> Result<Self, AutoOrganizeError> {
        let path = database_path(&config).ok_or_else(|| ConfigError::Validation {
            message: "No database path configured and no platform data directory".to_string(),
        })?;
        let store = ResultStore::new(Database::open(&path)?);
        let ctx = OrganizerContext::new(catalog, resolver, monitor, parser, store);
        Ok(Self::new(config, ctx))
    }

    pub fn config(&self) -> Arc<AutoOrganizeConfig> {
        self.config.snapshot()
    }

    pub fn shared_config(&self) -> SharedConfig {
        self.config.clone()
    }

    /// Validates and swaps the options. Runs already in flight keep theirs.
    pub fn update_config(&self, config: AutoOrganizeConfig) -> Result<(), ConfigError> {
        validate_config(&config)?;
        self.config.replace(config);
        info!("Auto-organize options updated");
        Ok(())
    }

    pub fn context(&self) -> &OrganizerContext {
        &self.ctx
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.ctx.events
    }

    pub fn scanner(&self) -> FolderScanner {
        self.scanner.clone()
    }

    pub async fn run_scan(&self, progress: &dyn ScanProgress, cancel: &CancelFlag) -> ScanSummary {
        let config = self.config.snapshot();
        self.scanner.run(&config, progress, cancel).await
    }

    /// A page of the log, newest first, with `is_in_progress` filled in.
    pub fn results(
        &self,
        start: u64,
        limit: Option<u64>,
    ) -> Result<QueryResult<OrganizationResult>, ServiceError> {
        let mut page = self.ctx.store.query_results(start, limit)?;
        for result in &mut page.items {
            result.is_in_progress = self.ctx.registry.is_in_progress(&result.id);
        }
        Ok(page)
    }

    pub fn result(&self, id: &str) -> Result<OrganizationResult, ServiceError> {
        let mut result = self
            .ctx
            .store
            .get_result(id)?
            .ok_or_else(|| ServiceError::ResultNotFound(id.to_string()))?;
        result.is_in_progress = self.ctx.registry.is_in_progress(id);
        Ok(result)
    }

    /// Deletes the source file of a logged result, then the record itself.
    pub fn delete_original_file(&self, id: &str) -> Result<(), ServiceError> {
        let result = self.result(id)?;
        let path = PathBuf::from(&result.original_path);

        self.ctx.monitor.report_file_system_change_beginning(&path);
        let deleted = if path.exists() {
            storage::delete_file(&path)
        } else {
            Ok(())
        };
        self.ctx.monitor.report_file_system_change_complete(&path, false);
        deleted?;

        self.ctx.store.delete_result(id)?;
        info!(file = %redact_path(&path), "Deleted original file");
        self.ctx.events.send(OrganizationEvent::ItemRemoved(result));
        Ok(())
    }

    pub fn clear_log(&self) -> Result<usize, ServiceError> {
        let removed = self.ctx.store.delete_all()?;
        self.ctx.events.send(OrganizationEvent::LogReset);
        Ok(removed)
    }

    /// Removes successful results only.
    pub fn clear_completed(&self) -> Result<usize, ServiceError> {
        let removed = self.ctx.store.delete_all_successful()?;
        self.ctx.events.send(OrganizationEvent::LogReset);
        Ok(removed)
    }

    /// Re-runs a logged result against its stored target.
    ///
    /// The work continues in the background; this waits at most
    /// `organizeWaitMillis` for it. `Ok(None)` means it is still running.
    pub async fn perform_organization(
        &self,
        id: &str,
    ) -> Result<Option<OrganizationResult>, ServiceError> {
        let result = self.result(id)?;
        if result.target_path.is_none() {
            return Err(ServiceError::NoTargetPath(id.to_string()));
        }

        let config = self.config.snapshot();
        let common = match result.kind {
            FileOrganizerKind::Episode => config.episode.common.clone(),
            FileOrganizerKind::Movie => config.movie.common.clone(),
            FileOrganizerKind::Unknown => return Err(ServiceError::UnknownKind(id.to_string())),
        };

        let ctx = self.ctx.clone();
        let handle = tokio::task::spawn_blocking(move || ctx.reorganize(result, &common));

        let wait = Duration::from_millis(config.organize_wait_millis);
        match tokio::time::timeout(wait, handle).await {
            Ok(Ok(result)) => Ok(Some(result)),
            Ok(Err(e)) => Err(ServiceError::TaskFailed(e.to_string())),
            Err(_) => {
                warn!(result_id = %id, "Organization still running after wait");
                Ok(None)
            }
        }
    }

    pub async fn organize_episode_with_correction(
        &self,
        correction: EpisodeCorrection,
    ) -> Result<OrganizationResult, ServiceError> {
        let previous = self.result(&correction.result_id)?;
        let config = self.config.snapshot();
        let path = PathBuf::from(&previous.original_path);
        Ok(self
            .episodes
            .organize(&path, &config.episode, Some(&correction))
            .await)
    }

    pub async fn organize_movie_with_correction(
        &self,
        correction: MovieCorrection,
    ) -> Result<OrganizationResult, ServiceError> {
        let previous = self.result(&correction.result_id)?;
        let config = self.config.snapshot();
        let path = PathBuf::from(&previous.original_path);
        Ok(self
            .movies
            .organize(&path, &config.movie, Some(&correction))
            .await)
    }

    pub fn smart_matches(
        &self,
        start: u64,
        limit: Option<u64>,
    ) -> Result<QueryResult<SmartMatchEntry>, ServiceError> {
        Ok(self.ctx.store.query_smart_matches(start, limit)?)
    }

    /// Removes one alias from an entry; the entry goes once it is empty.
    pub fn delete_smart_match_entry(&self, id: &str, match_string: &str) -> Result<(), ServiceError> {
        if self.ctx.store.delete_match_string(id, match_string)? {
            Ok(())
        } else {
            Err(ServiceError::SmartMatchNotFound(id.to_string()))
        }
    }

    pub fn delete_smart_match(&self, id: &str) -> Result<(), ServiceError> {
        if self.ctx.store.delete_smart_match(id)? {
            Ok(())
        } else {
            Err(ServiceError::SmartMatchNotFound(id.to_string()))
        }
    }
}
