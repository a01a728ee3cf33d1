//! Movie organizer.

use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::MovieOrganizeOptions;
use crate::error::OrganizeError;
use crate::library::{shares_provider_id, Movie, NewMovie, ProviderIds};
use crate::naming::{expand, is_name_match, match_score, TokenValues};
use crate::organize::request::{ItemSelection, MovieCorrection};
use crate::organize::result::{FileOrganizerKind, OrganizationResult};
use crate::organize::shared::{
    auto_detect_candidate, display_name, existing_target_conflict, lowercase_extension,
    pick_catalog_match, push_duplicate, same_stem_videos, CreationLocks, OrganizerContext,
};
use crate::sanitize::redact_path;
use crate::storage;

/// A movie to file away: already in the catalog, or waiting to be created
/// once its target path is known.
enum ResolvedMovie {
    Existing(Movie),
    Pending {
        name: String,
        year: Option<i32>,
        provider_ids: ProviderIds,
    },
}

impl ResolvedMovie {
    fn name(&self) -> &str {
        match self {
            Self::Existing(movie) => &movie.name,
            Self::Pending { name, .. } => name,
        }
    }

    fn year(&self) -> Option<i32> {
        match self {
            Self::Existing(movie) => movie.year,
            Self::Pending { year, .. } => *year,
        }
    }
}

#[derive(Clone)]
pub struct MovieOrganizer {
    ctx: OrganizerContext,
}

impl MovieOrganizer {
    pub fn new(ctx: OrganizerContext) -> Self {
        Self { ctx }
    }

    /// Organizes one file. The returned result has already been persisted.
    pub async fn organize(
        &self,
        path: &Path,
        options: &MovieOrganizeOptions,
        correction: Option<&MovieCorrection>,
    ) -> OrganizationResult {
        let mut result = OrganizationResult::new(path, storage::file_size(path).unwrap_or(0));
        let previous = self.ctx.previous_result(&result.id);

        let span = info_span!(
            "organize_movie",
            result_id = %result.id,
            file = %redact_path(path)
        );

        async {
            match self.run(path, options, correction, &mut result).await {
                Ok(()) => info!(status = %result.status, "Movie organize finished"),
                Err(e) => {
                    warn!(error = %e, "Movie organize failed");
                    result.fail(e.to_string());
                }
            }
            self.ctx.persist(&result, previous.as_ref());
        }
        .instrument(span)
        .await;

        result
    }

    async fn run(
        &self,
        path: &Path,
        options: &MovieOrganizeOptions,
        correction: Option<&MovieCorrection>,
        result: &mut OrganizationResult,
    ) -> Result<(), OrganizeError> {
        if self.ctx.monitor.is_path_locked(path) {
            return Err(OrganizeError::PathLocked);
        }

        let parsed = self.ctx.parser.parse_movie(path);
        if let Some(info) = &parsed {
            result.extracted_name = Some(info.name.clone());
            result.extracted_year = info.year;
        }
        if correction.is_none() && parsed.is_none() {
            return Err(OrganizeError::Extraction(format!(
                "Unable to determine movie name from {}",
                redact_path(path)
            )));
        }
        result.kind = FileOrganizerKind::Movie;

        let resolved = match correction {
            Some(c) => self.corrected_movie(c).await?,
            None => {
                let name = result.extracted_name.clone().unwrap_or_default();
                self.find_movie(&name, result.extracted_year, options).await?
            }
        };
        debug!(movie = %resolved.name(), "Movie resolved");

        if correction.map(|c| c.remember_correction).unwrap_or(false) {
            self.ctx.remember(
                FileOrganizerKind::Movie,
                resolved.name(),
                &display_name(resolved.name(), resolved.year()),
                result.extracted_name.as_deref(),
            );
        }

        let extension = lowercase_extension(path);
        let target_folder = correction.and_then(|c| c.target_folder.as_deref());
        let (movie, target) = self
            .target_path(resolved, &extension, target_folder, options)
            .await?;
        result.target_path = Some(target.to_string_lossy().into_owned());

        let duplicates = movie_duplicates(&movie, &target);
        result.duplicate_paths = duplicates.clone();

        if !options.common.overwrite_existing {
            if let Some(message) = existing_target_conflict(&target, result.file_size) {
                result.skip(message);
                return Ok(());
            }
            if !duplicates.is_empty() {
                result.skip(format!(
                    "Movie already exists in the library as {} other file(s)",
                    duplicates.len()
                ));
                return Ok(());
            }
        }

        let _guard = self.ctx.acquire(&result.id)?;
        self.ctx
            .transfer_blocking(path, &target, &options.common)
            .await?;
        result.succeed();

        if options.common.overwrite_existing {
            self.ctx
                .remove_duplicates_blocking(&duplicates, &target)
                .await;
        }

        Ok(())
    }

    async fn corrected_movie(
        &self,
        correction: &MovieCorrection,
    ) -> Result<ResolvedMovie, OrganizeError> {
        match &correction.movie {
            ItemSelection::Existing(id) => match self.ctx.catalog.get_movie(id).await? {
                Some(movie) => Ok(ResolvedMovie::Existing(movie)),
                None => Err(OrganizeError::IdentityResolution(format!(
                    "Movie with id {} not found",
                    id
                ))),
            },
            ItemSelection::New(item) => Ok(ResolvedMovie::Pending {
                name: item.name.clone(),
                year: item.year,
                provider_ids: item.provider_ids.clone(),
            }),
        }
    }

    async fn find_movie(
        &self,
        name: &str,
        year: Option<i32>,
        options: &MovieOrganizeOptions,
    ) -> Result<ResolvedMovie, OrganizeError> {
        let mut all = self.ctx.catalog.movies().await?;
        all.sort_by(|a, b| a.id.cmp(&b.id));

        let root = options.default_movie_library_path.as_deref().map(Path::new);
        if let Some(movie) = pick_catalog_match(&all, name, year, root, |m| {
            (m.name.as_str(), m.year, m.path.as_deref())
        }) {
            return Ok(ResolvedMovie::Existing(movie.clone()));
        }

        if let Some(item_name) = self.ctx.smart_match_item(FileOrganizerKind::Movie, name) {
            let remembered = all
                .iter()
                .find(|m| m.name == item_name)
                .or_else(|| all.iter().find(|m| is_name_match(&m.name, &item_name)));
            if let Some(movie) = remembered {
                debug!(alias = %name, "Movie found through smart match");
                return Ok(ResolvedMovie::Existing(movie.clone()));
            }
        }

        if options.common.auto_detect {
            let candidates = self.ctx.resolver.search_movie(name, year).await?;
            return match auto_detect_candidate(candidates, name, year) {
                Some(found) => Ok(ResolvedMovie::Pending {
                    name: found.name,
                    year: found.year,
                    provider_ids: found.provider_ids,
                }),
                None => Err(OrganizeError::IdentityResolution(format!(
                    "Unable to auto-detect movie \"{}\"",
                    name
                ))),
            };
        }

        Err(OrganizeError::IdentityResolution(format!(
            "Unable to find movie \"{}\" in the library",
            name
        )))
    }

    /// Returns the catalog movie the file belongs to and where it goes.
    /// Pending movies are created here, pointing at the new target.
    async fn target_path(
        &self,
        resolved: ResolvedMovie,
        extension: &str,
        target_folder: Option<&Path>,
        options: &MovieOrganizeOptions,
    ) -> Result<(Movie, PathBuf), OrganizeError> {
        let values = TokenValues {
            movie_name: Some(resolved.name().to_string()),
            movie_year: resolved.year(),
            extension: Some(extension.to_string()),
            ..Default::default()
        };
        let file_name = expand(&options.movie_pattern, &values)?;

        if let ResolvedMovie::Existing(movie) = &resolved {
            if let Some(folder) = movie.path.as_deref().and_then(Path::parent) {
                let target = folder.join(&file_name);
                return Ok((movie.clone(), target));
            }
        }

        let root = target_folder
            .map(Path::to_path_buf)
            .or_else(|| options.default_movie_library_path.as_ref().map(PathBuf::from))
            .ok_or_else(|| {
                OrganizeError::Configuration(
                    "No default movie library path configured".to_string(),
                )
            })?;
        let folder = if options.create_movie_folder {
            root.join(expand(&options.movie_folder_pattern, &values)?)
        } else {
            root
        };
        let target = folder.join(file_name);

        let movie = match resolved {
            ResolvedMovie::Existing(movie) => movie,
            ResolvedMovie::Pending {
                name,
                year,
                provider_ids,
            } => self.create_movie(name, year, provider_ids, &target).await?,
        };
        Ok((movie, target))
    }

    async fn create_movie(
        &self,
        name: String,
        year: Option<i32>,
        provider_ids: ProviderIds,
        target: &Path,
    ) -> Result<Movie, OrganizeError> {
        let key = CreationLocks::key(FileOrganizerKind::Movie, &name, year);
        self.ctx
            .creation_locks
            .with_lock(&key, self.create_movie_locked(name, year, provider_ids, target))
            .await
    }

    async fn create_movie_locked(
        &self,
        name: String,
        year: Option<i32>,
        provider_ids: ProviderIds,
        target: &Path,
    ) -> Result<Movie, OrganizeError> {
        let mut existing = self.ctx.catalog.movies().await?;
        existing.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(movie) = existing.iter().find(|m| {
            shares_provider_id(&m.provider_ids, &provider_ids)
                || match_score(&m.name, m.year, &name, year) == 2
                || (m.year.is_none() && year.is_none() && is_name_match(&m.name, &name))
        }) {
            debug!(movie_id = %movie.id, "Reusing existing movie");
            return Ok(movie.clone());
        }

        info!(movie = %name, "Creating new movie");
        let movie = self
            .ctx
            .catalog
            .create_movie(NewMovie {
                name,
                year,
                provider_ids,
                path: target.to_path_buf(),
            })
            .await?;
        Ok(movie)
    }
}

/// The movie's current file if it lives elsewhere, plus same-named videos
/// with another extension next to the target.
fn movie_duplicates(movie: &Movie, target: &Path) -> Vec<String> {
    let mut duplicates = Vec::new();
    if let Some(existing) = movie.path.as_deref().filter(|p| p.exists()) {
        push_duplicate(&mut duplicates, existing, target);
    }
    for path in same_stem_videos(target) {
        push_duplicate(&mut duplicates, &path, target);
    }
    duplicates
}
