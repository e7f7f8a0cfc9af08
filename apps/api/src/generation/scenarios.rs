//! Scenario generation: alternative solution designs from Solution Design insights.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::format_insights;
use crate::generation::prompts::SCENARIOS_PROMPT_TEMPLATE;
use crate::insights::Insight;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{parse_json_response, ChatMessage, CompletionService};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub title: String,
    pub description: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub estimated_cost: String,
    pub time_to_hire: String,
}

/// Fixed scenarios used when the model reply cannot be parsed.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            title: "Tillsvidareanställning".to_string(),
            description: "Rekrytera en person på heltid som bygger långsiktig kompetens i teamet."
                .to_string(),
            pros: vec![
                "Långsiktig kompetens stannar i bolaget".to_string(),
                "Stärker teamkulturen".to_string(),
            ],
            cons: vec![
                "Lång rekryteringstid".to_string(),
                "Högre fast kostnad".to_string(),
            ],
            estimated_cost: "Marknadslön plus cirka 45 % sociala avgifter och förmåner".to_string(),
            time_to_hire: "10-16 veckor".to_string(),
        },
        Scenario {
            title: "Konsult eller interim".to_string(),
            description: "Ta in en konsult för att snabbt täcka behovet medan en långsiktig lösning tas fram."
                .to_string(),
            pros: vec![
                "Snabb start".to_string(),
                "Flexibelt åtagande".to_string(),
            ],
            cons: vec![
                "Högre timkostnad".to_string(),
                "Kunskap kan försvinna vid avslut".to_string(),
            ],
            estimated_cost: "900-1 300 kr per timme".to_string(),
            time_to_hire: "1-4 veckor".to_string(),
        },
        Scenario {
            title: "Intern utveckling".to_string(),
            description: "Utveckla en befintlig medarbetare in i rollen och rekrytera bredare in i teamet."
                .to_string(),
            pros: vec![
                "Behåller och motiverar befintlig personal".to_string(),
                "Lägre rekryteringsrisk".to_string(),
            ],
            cons: vec![
                "Tar tid innan full effekt".to_string(),
                "Kräver mentorskap och utbildningsbudget".to_string(),
            ],
            estimated_cost: "Utbildningsbudget och lönejustering".to_string(),
            time_to_hire: "3-6 månader".to_string(),
        },
    ]
}

/// Parses the model reply, falling back to `default_scenarios()` on
/// malformed or empty output.
pub fn scenarios_from_reply(reply: &str) -> Vec<Scenario> {
    match parse_json_response::<Vec<Scenario>>(reply) {
        Ok(scenarios) if !scenarios.is_empty() => scenarios,
        Ok(_) => {
            warn!("Scenario generation returned an empty list, using defaults");
            default_scenarios()
        }
        Err(e) => {
            warn!("Scenario generation returned malformed JSON ({e}), using defaults");
            default_scenarios()
        }
    }
}

pub async fn generate_scenarios(
    llm: &dyn CompletionService,
    insights: &[Insight],
) -> Result<Vec<Scenario>, AppError> {
    let prompt = SCENARIOS_PROMPT_TEMPLATE.replace("{insights}", &format_insights(insights));
    let reply = llm
        .complete(&[ChatMessage::user(prompt)], JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Scenario generation failed: {e}")))?;

    let scenarios = scenarios_from_reply(&reply);
    info!("Generated {} scenarios", scenarios.len());
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_REPLY: &str = r#"```json
    [
      {
        "title": "Senior rekrytering",
        "description": "Anställ en senior backendutvecklare.",
        "pros": ["Långsiktigt"],
        "cons": ["Dyrt"],
        "estimated_cost": "720 000 kr/år",
        "time_to_hire": "12 veckor"
      }
    ]
    ```"#;

    #[test]
    fn test_parses_fenced_reply() {
        let scenarios = scenarios_from_reply(VALID_REPLY);
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].title, "Senior rekrytering");
        assert_eq!(scenarios[0].time_to_hire, "12 veckor");
    }

    #[test]
    fn test_malformed_reply_falls_back() {
        assert_eq!(scenarios_from_reply("Här är tre idéer..."), default_scenarios());
    }

    #[test]
    fn test_empty_list_falls_back() {
        assert_eq!(scenarios_from_reply("[]"), default_scenarios());
    }

    #[test]
    fn test_defaults_are_three_distinct_scenarios() {
        let defaults = default_scenarios();
        assert_eq!(defaults.len(), 3);
        assert_ne!(defaults[0].title, defaults[1].title);
        assert!(defaults.iter().all(|s| !s.pros.is_empty() && !s.cons.is_empty()));
    }
}
