//! Action plan generation: turns a chosen scenario into dated, owned steps.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::format_insights;
use crate::generation::prompts::ACTION_PLAN_PROMPT_TEMPLATE;
use crate::generation::scenarios::Scenario;
use crate::insights::Insight;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json_response, ChatMessage, CompletionService};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub week: u32,
    pub title: String,
    pub owner: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub steps: Vec<ActionStep>,
    pub success_metrics: Vec<String>,
}

fn step(week: u32, title: &str, owner: &str, description: &str) -> ActionStep {
    ActionStep {
        week,
        title: title.to_string(),
        owner: owner.to_string(),
        description: description.to_string(),
    }
}

/// Generic recruitment plan used when the model reply cannot be parsed.
pub fn default_action_plan() -> ActionPlan {
    ActionPlan {
        steps: vec![
            step(1, "Fastställ kravprofil", "Rekryterande chef", "Skriv kravprofil och annons utifrån insikterna."),
            step(2, "Publicera annons", "HR", "Publicera annonsen och starta aktiv sökning."),
            step(4, "Första intervjuer", "Rekryterande chef", "Genomför kompetensbaserade intervjuer."),
            step(6, "Case och referenser", "Teamet", "Praktiskt case med teamet och referenstagning."),
            step(8, "Erbjudande", "HR", "Skicka erbjudande och förhandla villkor."),
            step(12, "Introduktion", "Rekryterande chef", "Starta introduktionsplan med 30/60/90-dagarsmål."),
        ],
        success_metrics: vec![
            "Anställning klar inom 12 veckor".to_string(),
            "Ny medarbetare produktiv efter 90 dagar".to_string(),
        ],
    }
}

/// Parses the model reply; malformed or step-less output yields the default plan.
/// Steps are returned sorted by week.
pub fn action_plan_from_reply(reply: &str) -> ActionPlan {
    match parse_json_response::<ActionPlan>(reply) {
        Ok(mut plan) if !plan.steps.is_empty() => {
            plan.steps.sort_by_key(|s| s.week);
            plan
        }
        Ok(_) => {
            warn!("Action plan generation returned no steps, using default plan");
            default_action_plan()
        }
        Err(e) => {
            warn!("Action plan generation returned malformed JSON ({e}), using default plan");
            default_action_plan()
        }
    }
}

pub async fn generate_action_plan(
    llm: &dyn CompletionService,
    insights: &[Insight],
    scenario: Option<&Scenario>,
) -> Result<ActionPlan, AppError> {
    let scenario_text = match scenario {
        Some(s) => format!("{}: {}", s.title, s.description),
        None => "Inget scenario valt, utgå från insikterna.".to_string(),
    };
    let prompt = ACTION_PLAN_PROMPT_TEMPLATE
        .replace("{scenario}", &scenario_text)
        .replace("{insights}", &format_insights(insights));

    let reply = llm
        .complete(&[ChatMessage::user(prompt)], JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Action plan generation failed: {e}")))?;

    let plan = action_plan_from_reply(&reply);
    info!("Generated action plan with {} steps", plan.steps.len());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_sorts_steps() {
        let reply = r#"{
            "steps": [
                {"week": 6, "title": "Erbjudande", "owner": "HR", "description": "Skicka erbjudande"},
                {"week": 1, "title": "Annons", "owner": "CTO", "description": "Publicera annons"}
            ],
            "success_metrics": ["Anställd före sommaren"]
        }"#;
        let plan = action_plan_from_reply(reply);
        assert_eq!(plan.steps[0].week, 1);
        assert_eq!(plan.steps[1].title, "Erbjudande");
        assert_eq!(plan.success_metrics, vec!["Anställd före sommaren"]);
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        assert_eq!(action_plan_from_reply("{\"steps\": "), default_action_plan());
    }

    #[test]
    fn test_no_steps_falls_back() {
        assert_eq!(
            action_plan_from_reply(r#"{"steps": [], "success_metrics": []}"#),
            default_action_plan()
        );
    }

    #[test]
    fn test_default_plan_is_sorted() {
        let plan = default_action_plan();
        assert!(plan.steps.windows(2).all(|w| w[0].week <= w[1].week));
    }
}
