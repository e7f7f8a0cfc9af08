//! Text similarity, duplicate detection and same-category merging of insights.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::insights::models::{split_category, Insight};

/// Full-string similarity above which two insights are the same fact.
pub const DUPLICATE_THRESHOLD: f64 = 0.85;
/// Value similarity above which two same-category insights are the same fact.
pub const CATEGORY_VALUE_THRESHOLD: f64 = 0.80;
/// Lower bound (exclusive) of the "similar but not identical" merge band.
pub const MERGE_LOWER_BOUND: f64 = 0.5;
/// A value at least this many times longer than the other one wins a merge.
pub const LENGTH_PREFERENCE_RATIO: f64 = 1.3;

/// Words of this length or shorter are ignored by the Jaccard overlap.
const MIN_WORD_LEN: usize = 2;

/// Lowercases, replaces punctuation with spaces and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two already-normalized strings in `[0, 1]`.
///
/// Equal strings score 1.0, containment scores the length ratio, anything
/// else falls back to Jaccard overlap of words longer than two characters.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if a.contains(b) || b.contains(a) {
        let (shorter, longer) = if len_a <= len_b {
            (len_a, len_b)
        } else {
            (len_b, len_a)
        };
        return if longer == 0 {
            0.0
        } else {
            shorter as f64 / longer as f64
        };
    }

    let words_a = significant_words(a);
    let words_b = significant_words(b);
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Normalizes both sides before scoring.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    similarity(&normalize(a), &normalize(b))
}

fn significant_words(text: &str) -> HashSet<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .collect()
}

/// Two raw insight strings describe the same fact when the full strings are
/// nearly identical, or when they share a category and their values are.
pub fn is_duplicate(a: &str, b: &str) -> bool {
    if text_similarity(a, b) > DUPLICATE_THRESHOLD {
        return true;
    }

    match (split_category(a), split_category(b)) {
        (Some((cat_a, val_a)), Some((cat_b, val_b))) => {
            normalize(cat_a) == normalize(cat_b)
                && text_similarity(val_a, val_b) > CATEGORY_VALUE_THRESHOLD
        }
        _ => false,
    }
}

fn same_category(a: &Insight, b: &Insight) -> bool {
    normalize(&a.category) == normalize(&b.category)
}

/// Outcome of merging a candidate into an existing same-category insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "insight", rename_all = "snake_case")]
pub enum MergeDecision {
    /// The candidate supersedes the existing insight.
    Replace(Insight),
    /// The existing insight already says it all.
    KeepExisting,
    /// Both values joined under the shared category.
    Combine(Insight),
}

/// Decides how two similar same-category insights collapse into one.
pub fn merge_insights(existing: &Insight, candidate: &Insight) -> MergeDecision {
    let existing_len = existing.text.chars().count() as f64;
    let candidate_len = candidate.text.chars().count() as f64;

    if candidate_len >= existing_len * LENGTH_PREFERENCE_RATIO {
        return MergeDecision::Replace(candidate.clone());
    }
    if existing_len >= candidate_len * LENGTH_PREFERENCE_RATIO {
        return MergeDecision::KeepExisting;
    }

    let existing_norm = normalize(&existing.text);
    let candidate_norm = normalize(&candidate.text);

    if existing_norm.contains(&candidate_norm) {
        return MergeDecision::KeepExisting;
    }
    if !candidate_norm.contains(&existing_norm) {
        return MergeDecision::Combine(Insight::new(
            existing.category.clone(),
            format!("{}, {}", existing.text, candidate.text),
        ));
    }

    if candidate_len > existing_len {
        MergeDecision::Replace(candidate.clone())
    } else {
        MergeDecision::KeepExisting
    }
}

/// Folds `new` into `existing`: near-duplicates are dropped, similar
/// same-category insights are merged in place, the rest are appended.
pub fn deduplicate_insights(existing: &[Insight], new: &[Insight]) -> Vec<Insight> {
    let mut merged = existing.to_vec();

    for candidate in new {
        let candidate_str = candidate.to_string();

        if merged
            .iter()
            .any(|e| text_similarity(&e.to_string(), &candidate_str) > DUPLICATE_THRESHOLD)
        {
            debug!("Dropping near-duplicate insight: {candidate_str}");
            continue;
        }

        let merge_target = merged.iter().position(|e| {
            let score = text_similarity(&e.to_string(), &candidate_str);
            same_category(e, candidate) && score > MERGE_LOWER_BOUND && score < DUPLICATE_THRESHOLD
        });

        if let Some(idx) = merge_target {
            match merge_insights(&merged[idx], candidate) {
                MergeDecision::Replace(insight) | MergeDecision::Combine(insight) => {
                    debug!("Merged insight '{}' into '{}'", candidate_str, insight);
                    merged[idx] = insight;
                }
                MergeDecision::KeepExisting => {}
            }
            continue;
        }

        if merged
            .iter()
            .any(|e| is_duplicate(&e.to_string(), &candidate_str))
        {
            continue;
        }

        merged.push(candidate.clone());
    }

    merged
}
