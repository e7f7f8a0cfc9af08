//! Research gating and templated query generation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::insights::{Insight, Phase};
use crate::research::entities::{extract_entities, EntityType, ExtractedEntities};

/// Static per-phase research settings.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchConfig {
    pub enabled: bool,
    pub min_confidence: u8,
    pub required_entities: &'static [EntityType],
    pub max_queries: usize,
    /// Templates with `{entity_key}` placeholders.
    pub query_templates: &'static [&'static str],
}

pub fn research_config(phase: Phase) -> ResearchConfig {
    match phase {
        Phase::Context => ResearchConfig {
            enabled: true,
            min_confidence: 40,
            required_entities: &[EntityType::Role],
            max_queries: 2,
            query_templates: &[
                "Marknadslön för {role} i {location}",
                "Efterfrågan på {role} inom {industry}",
                "Typisk teamstruktur för {role} på företag med {company_size} anställda",
            ],
        },
        Phase::ProblemDiscovery => ResearchConfig {
            enabled: true,
            min_confidence: 50,
            required_entities: &[EntityType::Role],
            max_queries: 2,
            query_templates: &[
                "Vanliga orsaker till personalomsättning bland {role}",
                "Genomsnittlig rekryteringstid för {role} i {location}",
            ],
        },
        Phase::SolutionDesign => ResearchConfig {
            enabled: true,
            min_confidence: 70,
            required_entities: &[EntityType::Role, EntityType::Location],
            max_queries: 3,
            query_templates: &[
                "Lönenivåer för {role} i {location}",
                "Konkurrenter som rekryterar {role} i {location}",
                "Alternativ till heltidsrekrytering av {role} inom {industry}",
                "Konsultpriser för {seniority} {role} i {location}",
            ],
        },
        Phase::ActionPlan => ResearchConfig {
            enabled: false,
            min_confidence: 80,
            required_entities: &[],
            max_queries: 0,
            query_templates: &[],
        },
    }
}

/// Immutable snapshot passed to the trigger decision.
#[derive(Debug, Clone)]
pub struct ConversationState<'a> {
    pub current_phase: Phase,
    pub confidence: u8,
    pub insights: &'a [Insight],
}

/// Runs the research gate and hands back the extracted entities when it passes,
/// so query generation can reuse them.
pub fn research_entities(state: &ConversationState<'_>) -> Option<ExtractedEntities> {
    let config = research_config(state.current_phase);
    if !config.enabled || state.confidence < config.min_confidence {
        return None;
    }

    let entities = extract_entities(state.insights);
    let missing: Vec<String> = config
        .required_entities
        .iter()
        .filter(|e| !entities.contains(**e))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        debug!(
            "Research skipped for {}: missing entities {}",
            state.current_phase,
            missing.join(", ")
        );
        return None;
    }
    Some(entities)
}

pub fn should_trigger_research(state: &ConversationState<'_>) -> bool {
    research_entities(state).is_some()
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern must compile"));

/// Fills every `{key}` placeholder. Returns `None` if any key has no value.
fn fill_template(template: &str, entities: &ExtractedEntities) -> Option<String> {
    let mut filled = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (whole, key) = (caps.get(0)?, caps.get(1)?);
        let value = entities.get_key(key.as_str())?;
        filled.push_str(&template[last..whole.start()]);
        filled.push_str(value);
        last = whole.end();
    }
    filled.push_str(&template[last..]);
    Some(filled)
}

/// Interpolates entity values; templates with an unfilled placeholder are dropped whole.
pub fn generate_queries(templates: &[&str], entities: &ExtractedEntities) -> Vec<String> {
    templates
        .iter()
        .filter_map(|t| fill_template(t, entities))
        .collect()
}

/// The queries to issue for `phase`, capped at the phase's `max_queries`.
pub fn research_queries(phase: Phase, entities: &ExtractedEntities) -> Vec<String> {
    let config = research_config(phase);
    let mut queries = generate_queries(config.query_templates, entities);
    queries.truncate(config.max_queries);
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insights(raw: &[&str]) -> Vec<Insight> {
        raw.iter().map(|r| Insight::parse(r).unwrap()).collect()
    }

    fn role_and_location() -> Vec<Insight> {
        insights(&[
            "Roll: Senior Backend Developer",
            "Plats: Stockholm med hybridupplägg",
        ])
    }

    #[test]
    fn test_solution_design_triggers_with_role_and_location() {
        let insights = role_and_location();
        let state = ConversationState {
            current_phase: Phase::SolutionDesign,
            confidence: 90,
            insights: &insights,
        };
        assert!(should_trigger_research(&state));
    }

    #[test]
    fn test_gate_returns_entities_for_query_generation() {
        let insights = role_and_location();
        let state = ConversationState {
            current_phase: Phase::SolutionDesign,
            confidence: 90,
            insights: &insights,
        };
        let entities = research_entities(&state).unwrap();
        assert_eq!(entities.get(EntityType::Role), Some("Senior Backend Developer"));
        assert_eq!(entities.get(EntityType::Location), Some("Stockholm"));
        assert!(research_queries(Phase::SolutionDesign, &entities)
            .contains(&"Lönenivåer för Senior Backend Developer i Stockholm".to_string()));
    }

    #[test]
    fn test_below_min_confidence_does_not_trigger() {
        let insights = role_and_location();
        let state = ConversationState {
            current_phase: Phase::SolutionDesign,
            confidence: 69,
            insights: &insights,
        };
        assert!(!should_trigger_research(&state));
    }

    #[test]
    fn test_missing_required_entity_does_not_trigger() {
        let insights = insights(&["Roll: Senior Backend Developer"]);
        let state = ConversationState {
            current_phase: Phase::SolutionDesign,
            confidence: 95,
            insights: &insights,
        };
        assert!(!should_trigger_research(&state));
    }

    #[test]
    fn test_disabled_phase_never_triggers() {
        let insights = role_and_location();
        let state = ConversationState {
            current_phase: Phase::ActionPlan,
            confidence: 100,
            insights: &insights,
        };
        assert!(!should_trigger_research(&state));
    }

    #[test]
    fn test_generate_queries_fills_all_placeholders() {
        let mut entities = ExtractedEntities::default();
        entities.insert(EntityType::Role, "Backend Developer");
        entities.insert(EntityType::Location, "Malmö");
        let queries = generate_queries(&["Lön för {role} i {location}"], &entities);
        assert_eq!(queries, vec!["Lön för Backend Developer i Malmö"]);
    }

    #[test]
    fn test_generate_queries_drops_partially_filled_templates() {
        let mut entities = ExtractedEntities::default();
        entities.insert(EntityType::Role, "Backend Developer");
        let queries = generate_queries(
            &["Lön för {role} i {location}", "Efterfrågan på {role}"],
            &entities,
        );
        assert_eq!(queries, vec!["Efterfrågan på Backend Developer"]);
    }

    #[test]
    fn test_unknown_placeholder_drops_template() {
        let mut entities = ExtractedEntities::default();
        entities.insert(EntityType::Role, "Designer");
        assert!(generate_queries(&["{role} med {salary}"], &entities).is_empty());
    }

    #[test]
    fn test_template_without_placeholders_passes_through() {
        let queries = generate_queries(&["Rekryteringstrender 2025"], &ExtractedEntities::default());
        assert_eq!(queries, vec!["Rekryteringstrender 2025"]);
    }

    #[test]
    fn test_research_queries_truncates_to_max() {
        let mut entities = ExtractedEntities::default();
        for entity in EntityType::all() {
            entities.insert(entity, "x");
        }
        let queries = research_queries(Phase::SolutionDesign, &entities);
        assert_eq!(queries.len(), research_config(Phase::SolutionDesign).max_queries);
        assert_eq!(queries[0], "Lönenivåer för x i x");
    }
}
