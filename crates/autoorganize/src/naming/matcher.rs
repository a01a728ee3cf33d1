//! Name normalization and candidate scoring.
//!
//! Catalog titles and names extracted from release filenames rarely agree
//! character for character ("The.Office.US" vs "The Office (US)"), so both
//! sides are reduced to a comparable form before being compared.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters treated as word separators.
const SEPARATORS: &[char] = &[
    '.', '_', '&', '!', '(', ')', ':', ',', '-', '\'', '[', ']',
];

fn noise_words() -> &'static Regex {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"(?i)\b(?:and|a|the)\b").expect("static regex"))
}

fn strip_diacritics(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Reduces a name to its comparable form.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let padded = format!(" {} ", strip_diacritics(name));
    let separated: String = padded
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    let without_noise = noise_words().replace_all(&separated, " ");

    without_noise.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Two names match when their normalized forms are equal, ignoring case.
pub fn is_name_match(a: &str, b: &str) -> bool {
    normalize(a).to_lowercase() == normalize(b).to_lowercase()
}

fn strip_year(name: &str, year: Option<i32>) -> String {
    match year {
        Some(y) => name.replace(&y.to_string(), ""),
        None => name.to_string(),
    }
}

/// Scores a catalog candidate against an extracted name/year.
///
/// 1 point for a name match, 1 more when both years are known and equal.
/// Known but different years force the score to 0 even if the names match.
/// Each name has its own year removed first, since catalog titles often
/// embed the release year ("Wire (2002)").
pub fn match_score(
    candidate_name: &str,
    candidate_year: Option<i32>,
    query_name: &str,
    query_year: Option<i32>,
) -> i32 {
    let candidate = strip_year(candidate_name, candidate_year);
    let query = strip_year(query_name, query_year);

    if !is_name_match(&candidate, &query) {
        return 0;
    }

    match (candidate_year, query_year) {
        (Some(a), Some(b)) if a == b => 2,
        (Some(_), Some(_)) => 0,
        _ => 1,
    }
}

/// Picks the candidate with the strictly highest positive score.
///
/// Equal scores keep the first candidate encountered, so callers that need
/// a deterministic answer must hand the candidates over in a stable order.
pub fn best_match<T, F>(candidates: &[T], score: F) -> Option<&T>
where
    F: Fn(&T) -> i32,
{
    let mut best: Option<(&T, i32)> = None;
    for candidate in candidates {
        let s = score(candidate);
        if s <= 0 {
            continue;
        }
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(c, _)| c)
}

/// Like [`best_match`], but gives up when more than one candidate shares
/// the top score.
pub fn unique_best_match<T, F>(candidates: &[T], score: F) -> Option<&T>
where
    F: Fn(&T) -> i32,
{
    let scored: Vec<(&T, i32)> = candidates
        .iter()
        .map(|c| (c, score(c)))
        .filter(|(_, s)| *s > 0)
        .collect();
    let top = scored.iter().map(|(_, s)| *s).max()?;
    let mut winners = scored.into_iter().filter(|(_, s)| *s == top);
    let first = winners.next()?;
    if winners.next().is_some() {
        return None;
    }
    Some(first.0)
}
