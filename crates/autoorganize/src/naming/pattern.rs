//! Naming-pattern expansion.
//!
//! Recognized tokens:
//!
//! | token                     | value                                   |
//! |---------------------------|-----------------------------------------|
//! | `%sn` `%s.n` `%s_n`       | series name (space / dot / underscore)  |
//! | `%s` `%0s` `%00s`         | season number, padded to 1 / 2 / 3      |
//! | `%e` `%0e` `%00e`         | episode number                          |
//! | `%ed` `%0ed` `%00ed`      | ending episode number                   |
//! | `%en` `%e.n` `%e_n`       | episode title                           |
//! | `%mn` `%m.n` `%m_n`       | movie name                              |
//! | `%sy` `%my`               | series year / movie year                |
//! | `%fn`                     | full name, "Name (Year)" or "Name"      |
//! | `%ext`                    | file extension without the dot          |
//!
//! Short tokens are prefixes of longer ones (`%e` / `%en` / `%ed` / `%ext`)
//! and free-text values may themselves contain token-like text. The pattern
//! is scanned once, left to right: at each `%` the longest matching token
//! wins, and substituted values are never scanned again.

use sanitize_filename::{sanitize_with_options, Options as SanitizeOptions};

use crate::error::OrganizeError;

/// Longest file or folder name most filesystems accept, in bytes.
const MAX_SEGMENT_BYTES: usize = 255;

/// Values available to a naming pattern. Missing values expand to "".
#[derive(Debug, Clone, Default)]
pub struct TokenValues {
    pub series_name: Option<String>,
    pub series_year: Option<i32>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub ending_episode_number: Option<u32>,
    pub episode_title: Option<String>,
    pub movie_name: Option<String>,
    pub movie_year: Option<i32>,
    pub extension: Option<String>,
}

impl TokenValues {
    /// "Name (Year)" for the movie if one is set, otherwise for the series.
    pub fn full_name(&self) -> String {
        let (name, year) = if self.movie_name.is_some() {
            (self.movie_name.as_deref(), self.movie_year)
        } else {
            (self.series_name.as_deref(), self.series_year)
        };
        match (name, year) {
            (Some(n), Some(y)) => format!("{} ({})", n, y),
            (Some(n), None) => n.to_string(),
            (None, _) => String::new(),
        }
    }

    fn tokens(&self) -> Vec<(String, String)> {
        let mut tokens = Vec::new();
        push_name_variants(&mut tokens, 's', self.series_name.as_deref());
        push_name_variants(&mut tokens, 'e', self.episode_title.as_deref());
        push_name_variants(&mut tokens, 'm', self.movie_name.as_deref());
        tokens.push(("%fn".to_string(), self.full_name()));
        tokens.push(("%ext".to_string(), self.extension_text()));
        push_padded(&mut tokens, "s", self.season_number);
        push_padded(&mut tokens, "e", self.episode_number);
        push_padded(&mut tokens, "ed", self.ending_episode_number);
        tokens.push((
            "%sy".to_string(),
            self.series_year.map(|y| y.to_string()).unwrap_or_default(),
        ));
        tokens.push((
            "%my".to_string(),
            self.movie_year.map(|y| y.to_string()).unwrap_or_default(),
        ));
        tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        tokens
    }

    fn extension_text(&self) -> String {
        self.extension
            .as_deref()
            .map(|e| e.trim_start_matches('.').to_string())
            .unwrap_or_default()
    }
}

fn push_name_variants(tokens: &mut Vec<(String, String)>, prefix: char, value: Option<&str>) {
    let value = value.unwrap_or_default();
    tokens.push((format!("%{}n", prefix), value.to_string()));
    tokens.push((format!("%{}.n", prefix), value.replace(' ', ".")));
    tokens.push((format!("%{}_n", prefix), value.replace(' ', "_")));
}

fn push_padded(tokens: &mut Vec<(String, String)>, key: &str, value: Option<u32>) {
    let (plain, two, three) = match value {
        Some(n) => (n.to_string(), format!("{:02}", n), format!("{:03}", n)),
        None => (String::new(), String::new(), String::new()),
    };
    tokens.push((format!("%{}", key), plain));
    tokens.push((format!("%0{}", key), two));
    tokens.push((format!("%00{}", key), three));
}

/// Expands `pattern` without sanitizing the result.
///
/// An empty pattern is a configuration error: it only surfaces when an
/// organize attempt actually needs the pattern.
pub fn expand_raw(pattern: &str, values: &TokenValues) -> Result<String, OrganizeError> {
    if pattern.trim().is_empty() {
        return Err(OrganizeError::Configuration(
            "Naming pattern is empty; check the organize settings".to_string(),
        ));
    }

    let tokens = values.tokens();
    let mut result = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(pos) = rest.find('%') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match tokens.iter().find(|(token, _)| rest.starts_with(token.as_str())) {
            Some((token, value)) => {
                result.push_str(value);
                rest = &rest[token.len()..];
            }
            None => {
                result.push('%');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);

    Ok(result)
}

/// Expands `pattern` into a filesystem-safe file or folder name.
///
/// Over-long names are shortened in front of the `.<extension>` suffix, so
/// the result keeps its extension.
pub fn expand(pattern: &str, values: &TokenValues) -> Result<String, OrganizeError> {
    let raw = expand_raw(pattern, values)?;
    let name = clean_segment(&raw);

    let extension = values.extension_text();
    let suffix = format!(".{}", extension);
    let name = if !extension.is_empty() && name.len() > suffix.len() && name.ends_with(&suffix) {
        let stem = &name[..name.len() - suffix.len()];
        let stem = truncate_bytes(stem, MAX_SEGMENT_BYTES.saturating_sub(suffix.len()));
        format!("{}{}", stem, suffix)
    } else {
        truncate_bytes(&name, MAX_SEGMENT_BYTES)
    };

    if name.is_empty() {
        return Err(OrganizeError::Configuration(format!(
            "Naming pattern '{}' produced an empty name",
            pattern
        )));
    }
    Ok(name)
}

/// Makes a single path segment safe for every supported filesystem.
pub fn sanitize_segment(name: &str) -> String {
    truncate_bytes(&clean_segment(name), MAX_SEGMENT_BYTES)
}

fn clean_segment(name: &str) -> String {
    let options = SanitizeOptions {
        windows: true,
        truncate: false,
        replacement: "",
    };
    sanitize_with_options(name, options)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cuts `value` to at most `max` bytes on a char boundary. Trailing spaces
/// and dots are dropped, Windows rejects them.
fn truncate_bytes(value: &str, max: usize) -> String {
    let mut end = value.len().min(max);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].trim_end_matches([' ', '.']).to_string()
}
