//! Episode organizer: extract, resolve the series and episode, compute the
//! target path, check conflicts, then move.

use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::EpisodeOrganizeOptions;
use crate::error::OrganizeError;
use crate::library::{shares_provider_id, Episode, NewSeries, ProviderIds, Series};
use crate::naming::{expand, is_name_match, match_score, sanitize_segment, TokenValues};
use crate::organize::request::{EpisodeCorrection, ItemSelection};
use crate::organize::result::{FileOrganizerKind, OrganizationResult};
use crate::organize::shared::{
    auto_detect_candidate, display_name, existing_target_conflict, lowercase_extension,
    pick_catalog_match, push_duplicate, same_stem_videos, CreationLocks, OrganizerContext,
};
use crate::sanitize::redact_path;
use crate::storage;

/// Season/episode numbers an attempt is working with.
#[derive(Debug, Clone, Copy)]
struct Slot {
    season: u32,
    episode: u32,
    ending: Option<u32>,
}

impl Slot {
    fn is_multi_episode(&self) -> bool {
        self.ending.map(|e| e != self.episode).unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct EpisodeOrganizer {
    ctx: OrganizerContext,
}

impl EpisodeOrganizer {
    pub fn new(ctx: OrganizerContext) -> Self {
        Self { ctx }
    }

    /// Organizes one file. Never fails: every outcome is recorded on the
    /// returned result, which has already been persisted.
    pub async fn organize(
        &self,
        path: &Path,
        options: &EpisodeOrganizeOptions,
        correction: Option<&EpisodeCorrection>,
    ) -> OrganizationResult {
        let mut result = OrganizationResult::new(path, storage::file_size(path).unwrap_or(0));
        let previous = self.ctx.previous_result(&result.id);

        let span = info_span!(
            "organize_episode",
            result_id = %result.id,
            file = %redact_path(path)
        );

        async {
            match self.run(path, options, correction, &mut result).await {
                Ok(()) => info!(status = %result.status, "Episode organize finished"),
                Err(e) => {
                    warn!(error = %e, "Episode organize failed");
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
        options: &EpisodeOrganizeOptions,
        correction: Option<&EpisodeCorrection>,
        result: &mut OrganizationResult,
    ) -> Result<(), OrganizeError> {
        if self.ctx.monitor.is_path_locked(path) {
            return Err(OrganizeError::PathLocked);
        }

        let file_name = redact_path(path);
        let parsed = self.ctx.parser.parse_episode(path);
        if let Some(info) = &parsed {
            result.extracted_name = Some(info.name.clone());
            result.extracted_year = info.year;
        }

        let slot = match correction {
            Some(c) => Slot {
                season: c.season_number,
                episode: c.episode_number,
                ending: c.ending_episode_number,
            },
            None => {
                let info = parsed.as_ref().ok_or_else(|| {
                    OrganizeError::Extraction(format!(
                        "Unable to determine series name from {}",
                        file_name
                    ))
                })?;
                let season = info.season.ok_or_else(|| {
                    OrganizeError::Extraction(format!(
                        "Unable to determine season number from {}",
                        file_name
                    ))
                })?;
                let episode = info.episode.ok_or_else(|| {
                    OrganizeError::Extraction(format!(
                        "Unable to determine episode number from {}",
                        file_name
                    ))
                })?;
                Slot {
                    season,
                    episode,
                    ending: info.ending_episode,
                }
            }
        };
        result.extracted_season_number = Some(slot.season);
        result.extracted_episode_number = Some(slot.episode);
        result.extracted_ending_episode_number = slot.ending;
        result.kind = FileOrganizerKind::Episode;

        let series = match correction {
            Some(c) => self.corrected_series(c, options).await?,
            None => {
                let name = result.extracted_name.clone().unwrap_or_default();
                self.find_series(&name, result.extracted_year, options).await?
            }
        };
        debug!(series = %series.name, series_id = %series.id, "Series resolved");

        if correction.map(|c| c.remember_correction).unwrap_or(false) {
            self.ctx.remember(
                FileOrganizerKind::Episode,
                &series.name,
                &display_name(&series.name, series.year),
                result.extracted_name.as_deref(),
            );
        }

        let mut episodes = self.ctx.catalog.episodes(&series.id).await?;
        episodes.sort_by(|a, b| a.id.cmp(&b.id));

        let extension = lowercase_extension(path);
        let target = self
            .target_path(&series, &episodes, slot, &extension, correction, options)
            .await?;
        result.target_path = Some(target.to_string_lossy().into_owned());

        let duplicates = episode_duplicates(&episodes, slot, &target);
        result.duplicate_paths = duplicates.clone();

        if !options.common.overwrite_existing {
            if let Some(message) = existing_target_conflict(&target, result.file_size) {
                result.skip(message);
                return Ok(());
            }
            if !duplicates.is_empty() {
                result.skip(format!(
                    "Episode already exists in the library as {} other file(s)",
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

    async fn corrected_series(
        &self,
        correction: &EpisodeCorrection,
        options: &EpisodeOrganizeOptions,
    ) -> Result<Series, OrganizeError> {
        match &correction.series {
            ItemSelection::Existing(id) => self.ctx.catalog.get_series(id).await?.ok_or_else(|| {
                OrganizeError::IdentityResolution(format!("Series with id {} not found", id))
            }),
            ItemSelection::New(item) => {
                self.create_series(
                    &item.name,
                    item.year,
                    &item.provider_ids,
                    correction.target_folder.as_deref(),
                    options,
                )
                .await
            }
        }
    }

    /// Catalog match, then remembered aliases, then remote auto-detect.
    async fn find_series(
        &self,
        name: &str,
        year: Option<i32>,
        options: &EpisodeOrganizeOptions,
    ) -> Result<Series, OrganizeError> {
        let mut all = self.ctx.catalog.series().await?;
        all.sort_by(|a, b| a.id.cmp(&b.id));

        let root = options.default_series_library_path.as_deref().map(Path::new);
        if let Some(series) = pick_catalog_match(&all, name, year, root, |s| {
            (s.name.as_str(), s.year, s.path.as_deref())
        }) {
            return Ok(series.clone());
        }

        if let Some(item_name) = self.ctx.smart_match_item(FileOrganizerKind::Episode, name) {
            let remembered = all
                .iter()
                .find(|s| s.name == item_name)
                .or_else(|| all.iter().find(|s| is_name_match(&s.name, &item_name)));
            if let Some(series) = remembered {
                debug!(alias = %name, "Series found through smart match");
                return Ok(series.clone());
            }
        }

        if options.common.auto_detect {
            let candidates = self.ctx.resolver.search_series(name, year).await?;
            return match auto_detect_candidate(candidates, name, year) {
                Some(found) => {
                    self.create_series(&found.name, found.year, &found.provider_ids, None, options)
                        .await
                }
                None => Err(OrganizeError::IdentityResolution(format!(
                    "Unable to auto-detect series \"{}\"",
                    name
                ))),
            };
        }

        Err(OrganizeError::IdentityResolution(format!(
            "Unable to find series \"{}\" in the library",
            name
        )))
    }

    /// Creates the series unless one with the same provider ids or the
    /// same name and year appeared in the meantime.
    async fn create_series(
        &self,
        name: &str,
        year: Option<i32>,
        provider_ids: &ProviderIds,
        target_folder: Option<&Path>,
        options: &EpisodeOrganizeOptions,
    ) -> Result<Series, OrganizeError> {
        let key = CreationLocks::key(FileOrganizerKind::Episode, name, year);
        self.ctx
            .creation_locks
            .with_lock(
                &key,
                self.create_series_locked(name, year, provider_ids, target_folder, options),
            )
            .await
    }

    async fn create_series_locked(
        &self,
        name: &str,
        year: Option<i32>,
        provider_ids: &ProviderIds,
        target_folder: Option<&Path>,
        options: &EpisodeOrganizeOptions,
    ) -> Result<Series, OrganizeError> {
        let mut existing = self.ctx.catalog.series().await?;
        existing.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(series) = existing.iter().find(|s| {
            shares_provider_id(&s.provider_ids, provider_ids)
                || match_score(&s.name, s.year, name, year) == 2
                || (s.year.is_none() && year.is_none() && is_name_match(&s.name, name))
        }) {
            debug!(series_id = %series.id, "Reusing existing series");
            return Ok(series.clone());
        }

        let root = target_folder
            .map(Path::to_path_buf)
            .or_else(|| options.default_series_library_path.as_ref().map(PathBuf::from))
            .ok_or_else(|| {
                OrganizeError::Configuration(
                    "No default series library path configured".to_string(),
                )
            })?;
        let folder = expand(
            &options.series_folder_pattern,
            &TokenValues {
                series_name: Some(name.to_string()),
                series_year: year,
                ..Default::default()
            },
        )?;

        info!(series = %name, "Creating new series");
        let series = self
            .ctx
            .catalog
            .create_series(NewSeries {
                name: name.to_string(),
                year,
                provider_ids: provider_ids.clone(),
                path: root.join(folder),
            })
            .await?;
        Ok(series)
    }

    async fn target_path(
        &self,
        series: &Series,
        episodes: &[Episode],
        slot: Slot,
        extension: &str,
        correction: Option<&EpisodeCorrection>,
        options: &EpisodeOrganizeOptions,
    ) -> Result<PathBuf, OrganizeError> {
        // An episode already filed under this slot with this extension keeps its path.
        if let Some(existing) = episodes.iter().find(|e| {
            e.occupies_slot(slot.season, slot.episode, slot.ending)
                && e.extension().as_deref() == Some(extension)
        }) {
            return Ok(existing.path.clone());
        }

        let metadata = self
            .ctx
            .resolver
            .episode_metadata(series, slot.season, slot.episode, slot.ending)
            .await?
            .ok_or_else(|| {
                OrganizeError::MetadataNotFound(format!(
                    "No metadata found for {} season {} episode {}",
                    series.name, slot.season, slot.episode
                ))
            })?;

        let series_folder = match &series.path {
            Some(path) => path.clone(),
            None => {
                let root = correction
                    .and_then(|c| c.target_folder.clone())
                    .or_else(|| options.default_series_library_path.as_ref().map(PathBuf::from))
                    .ok_or_else(|| {
                        OrganizeError::Configuration(format!(
                            "Series {} has no folder and no default series library path is configured",
                            series.name
                        ))
                    })?;
                root.join(expand(
                    &options.series_folder_pattern,
                    &TokenValues {
                        series_name: Some(series.name.clone()),
                        series_year: series.year,
                        ..Default::default()
                    },
                )?)
            }
        };

        let season_folder = match episodes
            .iter()
            .filter(|e| e.season_number == slot.season)
            .find_map(|e| e.path.parent())
        {
            Some(existing) => existing.to_path_buf(),
            None => series_folder.join(season_folder_name(series, slot.season, options)?),
        };

        let values = TokenValues {
            series_name: Some(series.name.clone()),
            series_year: series.year,
            season_number: Some(slot.season),
            episode_number: Some(slot.episode),
            ending_episode_number: slot.ending,
            episode_title: metadata.name,
            extension: Some(extension.to_string()),
            ..Default::default()
        };
        let pattern = if slot.is_multi_episode() {
            &options.multi_episode_name_pattern
        } else {
            &options.episode_name_pattern
        };

        Ok(season_folder.join(expand(pattern, &values)?))
    }
}

fn season_folder_name(
    series: &Series,
    season: u32,
    options: &EpisodeOrganizeOptions,
) -> Result<String, OrganizeError> {
    if season == 0 {
        let name = sanitize_segment(&options.season_zero_folder_name);
        if name.is_empty() {
            return Err(OrganizeError::Configuration(
                "Season zero folder name is empty".to_string(),
            ));
        }
        return Ok(name);
    }
    expand(
        &options.season_folder_pattern,
        &TokenValues {
            series_name: Some(series.name.clone()),
            series_year: series.year,
            season_number: Some(season),
            ..Default::default()
        },
    )
}

/// Files already occupying the slot: catalog episodes with the same numbers
/// plus same-named videos with another extension next to the target.
fn episode_duplicates(episodes: &[Episode], slot: Slot, target: &Path) -> Vec<String> {
    let mut duplicates = Vec::new();
    for episode in episodes
        .iter()
        .filter(|e| e.occupies_slot(slot.season, slot.episode, slot.ending))
        .filter(|e| e.path.exists())
    {
        push_duplicate(&mut duplicates, &episode.path, target);
    }
    for path in same_stem_videos(target) {
        push_duplicate(&mut duplicates, &path, target);
    }
    duplicates
}
