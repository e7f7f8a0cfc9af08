use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::insights::models::{Insight, Phase};

/// Static per-phase completion requirements.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRequirements {
    pub min_insights: usize,
    pub required_categories: &'static [&'static str],
    pub optional_categories: &'static [&'static str],
    /// Minimum value length (in characters) for an insight to be substantial.
    pub quality_threshold: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub insight_count: usize,
    pub substantial_count: usize,
    pub required_covered: usize,
    pub required_total: usize,
    pub optional_covered: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub confidence: u8,
    pub breakdown: ConfidenceBreakdown,
    pub missing_categories: Vec<String>,
}

const REQUIRED_WEIGHT: f64 = 50.0;
const INSIGHT_WEIGHT: f64 = 30.0;
const OPTIONAL_WEIGHT: f64 = 20.0;

/// Narrower than the validator's filler list: these only stop an insight
/// from counting as substantial.
const UNSUBSTANTIAL_MARKERS: &[&str] = &["unknown", "ej specificerat", "inte angivet"];

pub fn phase_requirements(phase: Phase) -> PhaseRequirements {
    match phase {
        Phase::Context => PhaseRequirements {
            min_insights: 5,
            required_categories: &["Företag", "Roll", "Team"],
            optional_categories: &["Budget", "Tidslinje", "Kultur"],
            quality_threshold: 10,
        },
        Phase::ProblemDiscovery => PhaseRequirements {
            min_insights: 4,
            required_categories: &["Problem", "Orsak", "Påverkan"],
            optional_categories: &["Tidigare försök", "Brådska"],
            quality_threshold: 15,
        },
        Phase::SolutionDesign => PhaseRequirements {
            min_insights: 4,
            required_categories: &["Lösning", "Kompetens", "Scenario"],
            optional_categories: &["Risk", "Alternativ"],
            quality_threshold: 15,
        },
        Phase::ActionPlan => PhaseRequirements {
            min_insights: 3,
            required_categories: &["Milestone", "Ansvarig", "Tidslinje"],
            optional_categories: &[],
            quality_threshold: 10,
        },
    }
}

fn is_substantial(insight: &Insight, quality_threshold: usize) -> bool {
    let lower = insight.text.to_lowercase();
    insight.text.chars().count() >= quality_threshold
        && UNSUBSTANTIAL_MARKERS.iter().all(|m| !lower.contains(m))
}

fn is_covered(category: &str, insights: &[Insight]) -> bool {
    insights.iter().any(|i| i.covers(category))
}

/// Scores how complete the gathered information is for `phase`, 0–100.
///
/// required coverage × 50 + substantial count / min_insights × 30 (capped)
/// + optional coverage × 20 (full credit when the phase has none).
pub fn calculate_confidence(phase: Phase, insights: &[Insight]) -> ConfidenceResult {
    let req = phase_requirements(phase);

    let substantial_count = insights
        .iter()
        .filter(|i| is_substantial(i, req.quality_threshold))
        .count();

    let missing_categories: Vec<String> = req
        .required_categories
        .iter()
        .filter(|c| !is_covered(c, insights))
        .map(|c| c.to_string())
        .collect();

    let required_total = req.required_categories.len();
    let required_covered = required_total - missing_categories.len();
    let optional_covered = req
        .optional_categories
        .iter()
        .filter(|c| is_covered(c, insights))
        .count();

    let required_score = if required_total > 0 {
        required_covered as f64 / required_total as f64 * REQUIRED_WEIGHT
    } else {
        REQUIRED_WEIGHT
    };
    let insight_score = if req.min_insights > 0 {
        (substantial_count as f64 / req.min_insights as f64 * INSIGHT_WEIGHT).min(INSIGHT_WEIGHT)
    } else {
        INSIGHT_WEIGHT
    };
    let optional_score = if req.optional_categories.is_empty() {
        OPTIONAL_WEIGHT
    } else {
        optional_covered as f64 / req.optional_categories.len() as f64 * OPTIONAL_WEIGHT
    };

    let confidence = (required_score + insight_score + optional_score)
        .round()
        .clamp(0.0, 100.0) as u8;

    ConfidenceResult {
        confidence,
        breakdown: ConfidenceBreakdown {
            insight_count: insights.len(),
            substantial_count,
            required_covered,
            required_total,
            optional_covered,
        },
        missing_categories,
    }
}

/// String-keyed entry point. Unknown phase names degrade to a zero result.
pub fn calculate_confidence_for(phase_name: &str, insights: &[Insight]) -> ConfidenceResult {
    match phase_name.parse::<Phase>() {
        Ok(phase) => calculate_confidence(phase, insights),
        Err(e) => {
            warn!("{e}; reporting zero confidence");
            ConfidenceResult::default()
        }
    }
}
