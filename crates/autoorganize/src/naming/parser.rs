//! Default filename parser for scene-style release names.
//!
//! Handles the common shapes:
//! - "Breaking.Bad.S01E04.Cancer.Man.720p.mkv"
//! - "Show Name - 1x04-x05 - Title.avi"
//! - "Season 2/S02E03.mkv" (series name taken from the folder)
//! - "Heat.1995.1080p.BluRay.x264.mkv"

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::library::{EpisodeInfo, FileNameParser, MovieInfo};

/// Extensions treated as video.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "asf", "avi", "divx", "dvr-ms", "f4v", "flv", "iso", "m2t", "m2ts", "m4v", "mk3d",
    "mkv", "mov", "mp4", "mpeg", "mpg", "mts", "ogm", "ogv", "rec", "rmvb", "ts", "vob", "webm",
    "wmv", "wtv", "xvid",
];

pub fn is_video_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_video_extension)
        .unwrap_or(false)
}

fn sxxexx() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(.*?)\bs(\d{1,3})\s*e(\d{1,4})(?:\s*e(\d{1,4}))?\b").expect("static regex")
    })
}

fn nxnn() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(.*?)\b(\d{1,2})x(\d{2,3})(?:\s*x(\d{2,3}))?\b").expect("static regex")
    })
}

fn verbose() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(.*?)\bseason\s*(\d{1,3})\s*episode\s*(\d{1,4})\b").expect("static regex")
    })
}

fn season_folder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:season|series|s)\s*(\d{1,3})$").expect("static regex"))
}

fn year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("static regex"))
}

fn release_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:2160p|1080p|720p|480p|4k|uhd|bluray|bdrip|brrip|web\s?dl|webrip|web|hdtv|dvdrip|x264|x265|h264|h265|hevc|xvid|remux|proper|repack|extended|unrated)\b",
        )
        .expect("static regex")
    })
}

/// Dots and underscores become spaces; dashes are kept for the patterns
/// that need them and trimmed from names afterwards.
fn clean(stem: &str) -> String {
    stem.replace(['.', '_'], " ")
}

fn tidy_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '[' | '.'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a trailing release year off a name: "Show 2008" / "Show (2008)".
fn split_trailing_year(name: &str) -> (String, Option<i32>) {
    let trimmed = name.trim_end_matches(|c: char| c == ')' || c.is_whitespace());
    if let Some(m) = year().find_iter(trimmed).last() {
        if m.end() == trimmed.len() && m.start() > 0 {
            let year = m.as_str().parse().ok();
            return (tidy_name(&trimmed[..m.start()]), year);
        }
    }
    (tidy_name(name), None)
}

fn parse_num(m: Option<regex::Match<'_>>) -> Option<u32> {
    m.and_then(|m| m.as_str().parse().ok())
}

/// First folder name above the file that is not a season folder.
fn series_name_from_folders(path: &Path) -> Option<String> {
    path.ancestors()
        .skip(1)
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .find(|name| !season_folder().is_match(name.trim()))
        .map(|name| tidy_name(&clean(name)))
        .filter(|name| !name.is_empty())
}

fn season_from_folder(path: &Path) -> Option<u32> {
    let folder = path.parent()?.file_name()?.to_str()?;
    let caps = season_folder().captures(folder.trim())?;
    parse_num(caps.get(1))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RegexNameParser;

impl RegexNameParser {
    pub fn new() -> Self {
        Self
    }
}

impl FileNameParser for RegexNameParser {
    fn parse_episode(&self, path: &Path) -> Option<EpisodeInfo> {
        let stem = path.file_stem()?.to_str()?;
        let cleaned = clean(stem);

        let (raw_name, season, episode, ending) = if let Some(caps) = sxxexx().captures(&cleaned) {
            (
                caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
                parse_num(caps.get(2)),
                parse_num(caps.get(3)),
                parse_num(caps.get(4)),
            )
        } else if let Some(caps) = nxnn().captures(&cleaned) {
            (
                caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
                parse_num(caps.get(2)),
                parse_num(caps.get(3)),
                parse_num(caps.get(4)),
            )
        } else if let Some(caps) = verbose().captures(&cleaned) {
            (
                caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
                parse_num(caps.get(2)),
                parse_num(caps.get(3)),
                None,
            )
        } else {
            return None;
        };

        let (mut name, mut year) = split_trailing_year(raw_name);
        if name.is_empty() {
            let folder = series_name_from_folders(path)?;
            (name, year) = split_trailing_year(&folder);
        }
        if name.is_empty() {
            return None;
        }

        let info = EpisodeInfo {
            name,
            year,
            season: season.or_else(|| season_from_folder(path)),
            episode,
            ending_episode: ending,
        };

        debug!(
            series = %info.name,
            season = ?info.season,
            episode = ?info.episode,
            ending = ?info.ending_episode,
            "Parsed episode filename"
        );

        Some(info)
    }

    fn parse_movie(&self, path: &Path) -> Option<MovieInfo> {
        let stem = path.file_stem()?.to_str()?;
        let cleaned = clean(stem);

        // The name ends at the first release year that is not the whole title,
        // or at the first release tag.
        let year_match = year().find_iter(&cleaned).find(|m| m.start() > 0);
        let tag_start = release_tag().find(&cleaned).map(|m| m.start());

        let (name_end, year) = match (year_match, tag_start) {
            (Some(y), Some(t)) if t < y.start() => (t, None),
            (Some(y), _) => (y.start(), y.as_str().parse().ok()),
            (None, Some(t)) => (t, None),
            (None, None) => (cleaned.len(), None),
        };

        let name = tidy_name(&cleaned[..name_end]);
        if name.is_empty() {
            return None;
        }

        debug!(movie = %name, year = ?year, "Parsed movie filename");

        Some(MovieInfo { name, year })
    }

    fn is_video_file(&self, path: &Path) -> bool {
        is_video_path(path)
    }
}
