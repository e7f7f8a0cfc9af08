use tracing::debug;

use crate::insights::dedup::text_similarity;
use crate::insights::models::{split_category, Insight, MIN_CATEGORY_LEN};

/// Minimum number of characters after the category colon.
pub const MIN_CONTENT_LEN: usize = 10;

/// Similarity to an existing insight above which a candidate is a repeat.
pub const EXISTING_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Placeholder and filler language that makes a candidate worthless.
const FILLER_TOKENS: &[&str] = &[
    "unknown",
    "ej specificerat",
    "inte angivet",
    "okänd",
    "tbd",
    "cirka",
    "okej",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    Filler(&'static str),
    Duplicate,
    MissingCategory,
}

/// Runs the four rejection rules in order against a single candidate.
pub fn check_candidate(candidate: &str, existing: &[Insight]) -> Result<Insight, Rejection> {
    let content = split_category(candidate).map(|(_, text)| text).unwrap_or("");

    if content.chars().count() < MIN_CONTENT_LEN {
        return Err(Rejection::TooShort);
    }

    let content_lower = content.to_lowercase();
    if let Some(&token) = FILLER_TOKENS.iter().find(|t| content_lower.contains(*t)) {
        return Err(Rejection::Filler(token));
    }

    if existing
        .iter()
        .any(|e| text_similarity(&e.to_string(), candidate) > EXISTING_SIMILARITY_THRESHOLD)
    {
        return Err(Rejection::Duplicate);
    }

    Insight::parse(candidate).ok_or(Rejection::MissingCategory)
}

/// Filters this turn's candidates against the accumulated insights.
/// Accepted candidates keep their original order; rejects are dropped silently.
pub fn validate_insights(candidates: &[String], existing: &[Insight]) -> Vec<Insight> {
    candidates
        .iter()
        .filter_map(|candidate| match check_candidate(candidate, existing) {
            Ok(insight) => Some(insight),
            Err(reason) => {
                debug!("Rejected insight {candidate:?}: {reason:?}");
                None
            }
        })
        .collect()
}
