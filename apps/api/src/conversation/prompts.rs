// Conversation prompt templates, one per phase.
// Every table here is keyed by `Phase`; there is no string lookup.

use crate::insights::confidence::phase_requirements;
use crate::insights::{ConfidenceResult, Insight, Phase};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, INSIGHT_FORMAT_INSTRUCTION};

const ADVISOR_PERSONA: &str = "\
Du är en erfaren rekryteringsrådgivare som hjälper små och medelstora techbolag \
att rekrytera rätt. Du ställer en eller två fokuserade frågor åt gången, \
sammanfattar det du hört och skriver alltid på svenska.";

pub fn phase_prompt(phase: Phase) -> &'static str {
    match phase {
        Phase::Context => "\
FAS: Kontext. Kartlägg företaget (storlek, bransch, affärsmodell), rollen som ska \
tillsättas och teamet den ska ingå i. Fråga gärna om budget, tidslinje och kultur.",
        Phase::ProblemDiscovery => "\
FAS: Problemutforskning. Ta reda på vilket problem rekryteringen ska lösa, den \
bakomliggande orsaken och vilken påverkan problemet har på verksamheten. Fråga \
om tidigare försök och hur brådskande det är.",
        Phase::SolutionDesign => "\
FAS: Lösningsdesign. Arbeta fram möjliga lösningar: vilken kompetens som krävs, \
alternativa upplägg (anställning, konsult, omorganisation) och konkreta scenarier. \
Lyft risker och alternativ.",
        Phase::ActionPlan => "\
FAS: Handlingsplan. Bryt ned den valda lösningen i milstolpar med ansvariga och \
en realistisk tidslinje. Föreslå uppföljning efter anställning.",
    }
}

fn categories_line(phase: Phase) -> String {
    let req = phase_requirements(phase);
    let mut line = format!("Obligatoriska kategorier: {}.", req.required_categories.join(", "));
    if !req.optional_categories.is_empty() {
        line.push_str(&format!(
            " Valfria kategorier: {}.",
            req.optional_categories.join(", ")
        ));
    }
    line
}

/// Assembles the full system prompt for one conversational turn.
pub fn build_system_prompt(
    phase: Phase,
    insights: &[Insight],
    confidence: &ConfidenceResult,
    research_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "{ADVISOR_PERSONA}\n\n{}\n{}\n\n{INSIGHT_FORMAT_INSTRUCTION}\n{GROUNDING_INSTRUCTION}\n",
        phase_prompt(phase),
        categories_line(phase)
    );

    if insights.is_empty() {
        prompt.push_str("\nInga insikter är insamlade ännu.\n");
    } else {
        prompt.push_str("\nRedan kända insikter (upprepa dem inte):\n");
        for insight in insights {
            prompt.push_str(&format!("- {insight}\n"));
        }
    }

    if !confidence.missing_categories.is_empty() {
        prompt.push_str(&format!(
            "\nSaknas fortfarande: {}. Prioritera frågor om dessa.\n",
            confidence.missing_categories.join(", ")
        ));
    }

    if let Some(research) = research_context {
        prompt.push('\n');
        prompt.push_str(research);
    }

    prompt
}
