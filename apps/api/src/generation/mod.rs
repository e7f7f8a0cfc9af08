// Deliverable generation: solution scenarios and action plans.
// All LLM calls go through the CompletionService trait in llm_client.
// Malformed model output degrades to fixed fallback payloads.

pub mod action_plan;
pub mod prompts;
pub mod scenarios;

use crate::insights::Insight;

/// Renders insights as a bullet list for prompt templates.
pub(crate) fn format_insights(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return "(inga insikter)".to_string();
    }
    insights
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
