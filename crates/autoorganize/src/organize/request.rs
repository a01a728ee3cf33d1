//! User-supplied corrections for a previously logged file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::library::ProviderIds;

/// A catalog item the user wants created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSelection {
    /// Id of an item already in the catalog.
    Existing(String),
    New(NewItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeCorrection {
    pub result_id: String,
    pub series: ItemSelection,
    pub season_number: u32,
    pub episode_number: u32,
    pub ending_episode_number: Option<u32>,
    #[serde(default)]
    pub remember_correction: bool,
    /// Library folder for a newly created series.
    pub target_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCorrection {
    pub result_id: String,
    pub movie: ItemSelection,
    #[serde(default)]
    pub remember_correction: bool,
    /// Library folder for a newly created movie.
    pub target_folder: Option<PathBuf>,
}
