//! Prompt shaping: content filtering and safe file names.

use regex::Regex;
use std::sync::OnceLock;

const REMOVED: &str = "[content removed]";

const SAFE_PREFIX: &str = "Create a family-friendly, non-violent, and non-controversial image \
based on the following description. Do not include any inappropriate, offensive, or adult \
content. The image should be suitable for all ages. Description: ";

const BLOCKED_TERMS: &[&str] = &[
    "nude",
    "naked",
    "sex",
    "porn",
    "explicit",
    "violence",
    "gore",
    "blood",
    "kill",
    "murder",
    "terrorist",
    "bomb",
    "weapon",
    "gun",
    "illegal",
    "drug",
    "cocaine",
    "heroin",
    "meth",
    "graphic",
    "disturbing",
    "offensive",
    "controversial",
    "political",
    "hate speech",
    "racist",
    "sexist",
    "discriminatory",
    "abuse",
    "assault",
    "harass",
    "threat",
    "extremist",
    "radical",
    "jihad",
    "nazi",
    "holocaust",
    "suicide",
    "self-harm",
    "eating disorder",
    "anorexia",
    "bulimia",
];

fn blocked_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let terms = BLOCKED_TERMS
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i).{{0,20}}\b(?:{terms})\b.{{0,20}}")).expect("Invalid regex")
    })
}

/// Removes blocklisted terms, with a little surrounding context, from text
/// that will be sent to an image backend.
#[must_use]
pub fn filter_content(text: &str) -> String {
    let filtered = blocked_pattern().replace_all(text, REMOVED);
    filtered
        .trim()
        .trim_start_matches(REMOVED)
        .trim_end_matches(REMOVED)
        .trim()
        .to_string()
}

/// Wraps a description in the family-friendly framing used for retries.
#[must_use]
pub fn safe_prompt(description: &str) -> String {
    format!("{SAFE_PREFIX}{description}")
}

/// File-name friendly form of a title: unsafe characters and spaces become
/// underscores, capped at 100 characters.
#[must_use]
pub fn safe_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect()
}

/// Directory name for a location, e.g. `Lillooet, BC` becomes `Lillooet__BC_comics`.
#[must_use]
pub fn location_dir(location: &str) -> String {
    format!("{}_comics", safe_title(location))
}
