//! Conversation turn: orchestrates one user message end to end.
//!
//! Flow: pre-call confidence → research gate (optional research) →
//!       system prompt → LLM call → parse → validate → dedup/merge →
//!       post-call confidence → advance / scenario decisions → canvas state.
//!
//! Pure with respect to persistence: the caller owns the insight list and
//! stores whatever this returns.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::canvas::{get_active_canvas_state, CanvasState, CanvasStateMachine};
use crate::config::Config;
use crate::conversation::prompts::build_system_prompt;
use crate::errors::AppError;
use crate::insights::dedup::deduplicate_insights;
use crate::insights::parser::parse_insights;
use crate::insights::validation::validate_insights;
use crate::insights::{calculate_confidence, ConfidenceResult, Insight, Phase};
use crate::llm_client::{ChatMessage, CompletionService};
use crate::research::{
    format_research_context, research_entities, research_queries, run_research,
    ConversationState, ResearchSession,
};

/// Tunables for the turn pipeline, taken from `Config`.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub research_timeout: Duration,
    pub phase_advance_threshold: u8,
    pub scenario_trigger_threshold: u8,
}

impl From<&Config> for TurnSettings {
    fn from(config: &Config) -> Self {
        Self {
            research_timeout: Duration::from_secs(config.research_timeout_secs),
            phase_advance_threshold: config.phase_advance_threshold,
            scenario_trigger_threshold: config.scenario_trigger_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnInput {
    pub phase: Phase,
    /// Prior messages, oldest first.
    pub history: Vec<ChatMessage>,
    pub user_message: String,
    /// Insights accumulated before this turn.
    pub insights: Vec<Insight>,
    pub has_scenarios: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub message: String,
    /// Insights accepted by validation this turn, before merging.
    pub new_insights: Vec<Insight>,
    /// Full insight list after merging; the new canonical state.
    pub insights: Vec<Insight>,
    pub previous_confidence: u8,
    pub confidence: ConfidenceResult,
    pub research: ResearchSession,
    pub ready_to_advance: bool,
    pub next_phase: Option<Phase>,
    pub trigger_scenarios: bool,
    pub canvas_state: CanvasState,
}

/// Runs research when the pre-call state warrants it.
/// Always returns; failures only mean no extra context.
async fn gather_research(
    llm: &dyn CompletionService,
    settings: &TurnSettings,
    state: &ConversationState<'_>,
    session: &mut ResearchSession,
) -> Option<String> {
    let entities = research_entities(state)?;
    let queries = research_queries(state.current_phase, &entities);
    if queries.is_empty() {
        debug!("Research triggered but no template could be filled");
        return None;
    }

    info!(
        "Running {} research queries for phase {}",
        queries.len(),
        state.current_phase
    );
    session.begin(&queries);
    let outcome = run_research(llm, &queries, settings.research_timeout).await;
    session.finish(&outcome);
    format_research_context(&outcome)
}

pub async fn run_turn(
    llm: &dyn CompletionService,
    settings: &TurnSettings,
    input: TurnInput,
) -> Result<TurnOutcome, AppError> {
    let TurnInput {
        phase,
        mut history,
        user_message,
        insights: existing,
        has_scenarios,
    } = input;

    // Step 1: confidence before the call
    let pre = calculate_confidence(phase, &existing);

    // Step 2: research gate
    let mut research = ResearchSession::default();
    let state = ConversationState {
        current_phase: phase,
        confidence: pre.confidence,
        insights: &existing,
    };
    let research_context = gather_research(llm, settings, &state, &mut research).await;

    // Step 3: LLM call
    let system = build_system_prompt(phase, &existing, &pre, research_context.as_deref());
    history.push(ChatMessage::user(user_message));
    let raw = llm
        .complete(&history, &system)
        .await
        .map_err(|e| AppError::Llm(format!("Conversation turn failed: {e}")))?;

    // Step 4: extract, filter and merge insights
    let parsed = parse_insights(&raw);
    let new_insights = validate_insights(&parsed.candidate_insights, &existing);
    let insights = deduplicate_insights(&existing, &new_insights);

    // Step 5: confidence after the call
    let confidence = calculate_confidence(phase, &insights);
    info!(
        "Turn in {}: {} candidates, {} accepted, confidence {} -> {}",
        phase,
        parsed.candidate_insights.len(),
        new_insights.len(),
        pre.confidence,
        confidence.confidence
    );

    // Step 6: follow-up decisions
    let next_phase = phase.next();
    let ready_to_advance =
        next_phase.is_some() && confidence.confidence >= settings.phase_advance_threshold;
    let trigger_scenarios = phase == Phase::SolutionDesign
        && !has_scenarios
        && confidence.confidence >= settings.scenario_trigger_threshold;

    let canvas_state = get_active_canvas_state(&CanvasStateMachine {
        is_generating: false,
        is_researching: research.is_researching,
        is_generating_scenarios: trigger_scenarios,
        has_scenarios,
        current_phase: phase,
        confidence: confidence.confidence,
        insights: insights.clone(),
    });

    Ok(TurnOutcome {
        message: parsed.message,
        new_insights,
        insights,
        previous_confidence: pre.confidence,
        confidence,
        research,
        ready_to_advance,
        next_phase,
        trigger_scenarios,
        canvas_state,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::research::prompts::{RESEARCH_CONTEXT_HEADER, RESEARCH_SYSTEM};

    /// Replies with a fixed chat response; research prompts get a canned
    /// summary or an error. Records every system prompt it sees.
    struct FakeLlm {
        reply: Option<String>,
        research_fails: bool,
        systems: Mutex<Vec<String>>,
    }

    impl FakeLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                research_fails: false,
                systems: Mutex::new(vec![]),
            }
        }

        fn chat_system(&self) -> String {
            self.systems
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.as_str() != RESEARCH_SYSTEM)
                .cloned()
                .unwrap_or_default()
        }

        fn research_calls(&self) -> usize {
            self.systems
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.as_str() == RESEARCH_SYSTEM)
                .count()
        }
    }

    #[async_trait]
    impl CompletionService for FakeLlm {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            system: &str,
        ) -> Result<String, LlmError> {
            self.systems.lock().unwrap().push(system.to_string());
            if system == RESEARCH_SYSTEM {
                return if self.research_fails {
                    Err(LlmError::EmptyContent)
                } else {
                    Ok(format!("Fakta om: {}", messages[0].content))
                };
            }
            self.reply.clone().ok_or(LlmError::EmptyContent)
        }
    }

    fn settings() -> TurnSettings {
        TurnSettings {
            research_timeout: Duration::from_secs(5),
            phase_advance_threshold: 80,
            scenario_trigger_threshold: 70,
        }
    }

    fn insights(raw: &[&str]) -> Vec<Insight> {
        raw.iter().map(|r| Insight::parse(r).unwrap()).collect()
    }

    fn input(phase: Phase, existing: Vec<Insight>) -> TurnInput {
        TurnInput {
            phase,
            history: vec![],
            user_message: "Vi behöver förstärka backend-teamet.".to_string(),
            insights: existing,
            has_scenarios: false,
        }
    }

    fn solution_design_insights() -> Vec<Insight> {
        insights(&[
            "Lösning: Rekrytera en senior utvecklare internt",
            "Kompetens: Rust och distribuerade system",
            "Scenario: Heltidsanställning i Stockholm",
            "Roll: Senior Backend Developer",
            "Plats: Stockholm med hybridupplägg",
        ])
    }

    const CONTEXT_REPLY: &str = "Tack! Hur ser budgeten ut?\n\n###INSIGHTS###\n\
        - Företag: 25 personer B2B SaaS\n\
        - Roll: Senior Backend Developer\n\
        - Team: 5 utvecklare\n\
        - Budget: ca\n";

    #[tokio::test]
    async fn test_context_turn_extracts_and_scores() {
        let llm = FakeLlm::replying(CONTEXT_REPLY);
        let outcome = run_turn(&llm, &settings(), input(Phase::Context, vec![]))
            .await
            .unwrap();

        assert_eq!(outcome.message, "Tack! Hur ser budgeten ut?");
        assert_eq!(outcome.new_insights.len(), 3);
        assert_eq!(outcome.insights.len(), 3);
        assert_eq!(outcome.previous_confidence, 0);
        assert_eq!(outcome.confidence.confidence, 68);
        assert!(!outcome.ready_to_advance);
        assert!(!outcome.trigger_scenarios);
        assert_eq!(outcome.canvas_state, CanvasState::Confidence);
        assert_eq!(llm.research_calls(), 0);
    }

    #[tokio::test]
    async fn test_research_runs_before_chat_call() {
        let llm = FakeLlm::replying(
            "Bra.\n###INSIGHTS###\n- Risk: Kandidatbrist på Rust-utvecklare i regionen\n",
        );
        let outcome = run_turn(
            &llm,
            &settings(),
            input(Phase::SolutionDesign, solution_design_insights()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.previous_confidence, 80);
        assert_eq!(llm.research_calls(), 3);
        assert_eq!(outcome.research.completed, 3);
        assert!(!outcome.research.is_researching);
        assert!(llm.chat_system().contains(RESEARCH_CONTEXT_HEADER));
        assert!(llm
            .chat_system()
            .contains("Fakta om: Lönenivåer för Senior Backend Developer i Stockholm"));

        assert_eq!(outcome.confidence.confidence, 90);
        assert!(outcome.ready_to_advance);
        assert_eq!(outcome.next_phase, Some(Phase::ActionPlan));
        assert!(outcome.trigger_scenarios);
        assert_eq!(outcome.canvas_state, CanvasState::GeneratingScenarios);
    }

    #[tokio::test]
    async fn test_research_failure_does_not_fail_turn() {
        let llm = FakeLlm {
            research_fails: true,
            ..FakeLlm::replying("Okej, vi fortsätter.")
        };
        let outcome = run_turn(
            &llm,
            &settings(),
            input(Phase::SolutionDesign, solution_design_insights()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.research.failed, 3);
        assert_eq!(outcome.research.completed, 0);
        assert!(!llm.chat_system().contains(RESEARCH_CONTEXT_HEADER));
        assert_eq!(outcome.message, "Okej, vi fortsätter.");
        assert_eq!(outcome.insights, solution_design_insights());
    }

    #[tokio::test]
    async fn test_chat_failure_is_turn_failure() {
        let llm = FakeLlm {
            reply: None,
            ..FakeLlm::replying("")
        };
        let err = run_turn(&llm, &settings(), input(Phase::Context, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_repeated_insights_are_not_added_twice() {
        let existing = insights(&["Roll: Senior Backend Developer"]);
        let llm = FakeLlm::replying("Noterat.\n###INSIGHTS###\n- Roll: senior backend developer\n");
        let outcome = run_turn(&llm, &settings(), input(Phase::Context, existing.clone()))
            .await
            .unwrap();
        assert!(outcome.new_insights.is_empty());
        assert_eq!(outcome.insights, existing);
        assert_eq!(
            outcome.previous_confidence,
            outcome.confidence.confidence
        );
    }

    #[tokio::test]
    async fn test_history_and_user_message_are_sent() {
        struct CountingLlm(Mutex<usize>);

        #[async_trait]
        impl CompletionService for CountingLlm {
            async fn complete(
                &self,
                messages: &[ChatMessage],
                _system: &str,
            ) -> Result<String, LlmError> {
                *self.0.lock().unwrap() = messages.len();
                assert_eq!(messages.last().unwrap().role, crate::llm_client::ChatRole::User);
                Ok("Hej".to_string())
            }
        }

        let llm = CountingLlm(Mutex::new(0));
        let mut turn = input(Phase::Context, vec![]);
        turn.history = vec![ChatMessage::user("Hej"), ChatMessage::assistant("Hej!")];
        run_turn(&llm, &settings(), turn).await.unwrap();
        assert_eq!(*llm.0.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_last_phase_never_ready_to_advance() {
        let llm = FakeLlm::replying(
            "Klart.\n###INSIGHTS###\n\
             - Milestone: Annons publicerad vecka 2\n\
             - Ansvarig: HR-chefen Anna Berg\n\
             - Tidslinje: Anställning klar inom 12 veckor\n",
        );
        let outcome = run_turn(&llm, &settings(), input(Phase::ActionPlan, vec![]))
            .await
            .unwrap();
        assert_eq!(outcome.confidence.confidence, 100);
        assert!(!outcome.ready_to_advance);
        assert_eq!(outcome.next_phase, None);
        assert_eq!(outcome.canvas_state, CanvasState::PhaseProgress);
    }
}
