use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::canvas::{get_active_canvas_state, CanvasState, CanvasStateMachine};
use crate::conversation::store;
use crate::conversation::turn::{run_turn, TurnInput, TurnOutcome};
use crate::errors::AppError;
use crate::generation::action_plan::{generate_action_plan, ActionPlan};
use crate::generation::scenarios::{generate_scenarios, Scenario};
use crate::insights::confidence::calculate_confidence_for;
use crate::insights::{calculate_confidence, ConfidenceResult, Insight, Phase};
use crate::llm_client::ChatMessage;
use crate::models::conversation::{ConversationRow, MessageRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Deserialize, Default)]
pub struct ActionPlanRequest {
    /// Index into the stored scenarios; `None` plans from insights alone.
    #[serde(default)]
    pub scenario_index: Option<usize>,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub conversation: ConversationRow,
    pub messages: Vec<MessageRow>,
    pub confidence: ConfidenceResult,
    pub canvas_state: CanvasState,
}

#[derive(Serialize)]
pub struct AdvanceResponse {
    pub phase: Phase,
    pub confidence: ConfidenceResult,
}

#[derive(Serialize)]
pub struct CanvasResponse {
    pub state: CanvasState,
}

/// Parses the stored phase label. A bad label means the row was written by
/// something other than this service.
fn stored_phase(row: &ConversationRow) -> Result<Phase, AppError> {
    Phase::from_str(&row.phase).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Conversation {} has {e}", row.id))
    })
}

/// Loads stored insight strings, skipping any that no longer parse.
fn stored_insights(row: &ConversationRow) -> Vec<Insight> {
    row.insights
        .iter()
        .filter_map(|raw| {
            let parsed = Insight::parse(raw);
            if parsed.is_none() {
                warn!("Skipping malformed stored insight in {}: '{raw}'", row.id);
            }
            parsed
        })
        .collect()
}

fn history_from_rows(rows: &[MessageRow]) -> Vec<ChatMessage> {
    rows.iter()
        .filter_map(|row| match row.role.as_str() {
            "user" => Some(ChatMessage::user(row.content.clone())),
            "assistant" => Some(ChatMessage::assistant(row.content.clone())),
            other => {
                warn!("Skipping message {} with unknown role '{other}'", row.id);
                None
            }
        })
        .collect()
}

fn stored_scenarios(row: &ConversationRow) -> Vec<Scenario> {
    row.scenarios
        .as_ref()
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

async fn load_conversation(state: &AppState, id: Uuid) -> Result<ConversationRow, AppError> {
    store::get_conversation(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))
}

/// POST /api/v1/conversations
pub async fn handle_create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationRow>), AppError> {
    let row = store::create_conversation(&state.db, req.user_id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/conversations/:id
pub async fn handle_get_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = load_conversation(&state, id).await?;
    let insights = stored_insights(&conversation);
    let messages = store::list_messages(&state.db, id).await?;

    // Reads degrade on a bad phase label instead of failing.
    let confidence = calculate_confidence_for(&conversation.phase, &insights);
    let canvas_state = match Phase::from_str(&conversation.phase) {
        Ok(phase) => get_active_canvas_state(&CanvasStateMachine {
            is_generating: false,
            is_researching: false,
            is_generating_scenarios: false,
            has_scenarios: conversation.scenarios.is_some(),
            current_phase: phase,
            confidence: confidence.confidence,
            insights,
        }),
        Err(_) => CanvasState::PhaseProgress,
    };

    Ok(Json(ConversationResponse {
        conversation,
        messages,
        confidence,
        canvas_state,
    }))
}

/// POST /api/v1/conversations/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message content must not be empty".to_string()));
    }

    let conversation = load_conversation(&state, id).await?;
    let phase = stored_phase(&conversation)?;
    let history = history_from_rows(&store::list_messages(&state.db, id).await?);

    let outcome = run_turn(
        state.llm.as_ref(),
        &state.turn_settings,
        TurnInput {
            phase,
            history,
            user_message: content.to_string(),
            insights: stored_insights(&conversation),
            has_scenarios: conversation.scenarios.is_some(),
        },
    )
    .await?;

    // Nothing is persisted until the model call has succeeded.
    store::save_turn(
        &state.db,
        id,
        content,
        &outcome.message,
        &outcome.insights,
        outcome.confidence.confidence,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /api/v1/conversations/:id/advance
pub async fn handle_advance_phase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let conversation = load_conversation(&state, id).await?;
    let phase = stored_phase(&conversation)?;
    let insights = stored_insights(&conversation);

    let next = phase
        .next()
        .ok_or_else(|| AppError::Validation(format!("{phase} is the last phase")))?;

    let current = calculate_confidence(phase, &insights);
    let threshold = state.turn_settings.phase_advance_threshold;
    if current.confidence < threshold {
        return Err(AppError::Validation(format!(
            "Confidence {} is below the advance threshold {threshold}",
            current.confidence
        )));
    }

    let confidence = calculate_confidence(next, &insights);
    store::set_phase(&state.db, id, next, confidence.confidence).await?;

    Ok(Json(AdvanceResponse {
        phase: next,
        confidence,
    }))
}

/// POST /api/v1/conversations/:id/scenarios
pub async fn handle_generate_scenarios(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Scenario>>, AppError> {
    let conversation = load_conversation(&state, id).await?;
    let insights = stored_insights(&conversation);

    let scenarios = generate_scenarios(state.llm.as_ref(), &insights).await?;
    let value = serde_json::to_value(&scenarios).map_err(anyhow::Error::from)?;
    store::save_scenarios(&state.db, id, &value).await?;

    info!("Stored {} scenarios for conversation {id}", scenarios.len());
    Ok(Json(scenarios))
}

/// POST /api/v1/conversations/:id/action-plan
pub async fn handle_generate_action_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ActionPlanRequest>>,
) -> Result<Json<ActionPlan>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let conversation = load_conversation(&state, id).await?;
    let insights = stored_insights(&conversation);
    let scenarios = stored_scenarios(&conversation);

    let scenario = match req.scenario_index {
        Some(i) => Some(scenarios.get(i).ok_or_else(|| {
            AppError::Validation(format!(
                "Scenario index {i} out of range ({} stored)",
                scenarios.len()
            ))
        })?),
        None => None,
    };

    let plan = generate_action_plan(state.llm.as_ref(), &insights, scenario).await?;
    let value = serde_json::to_value(&plan).map_err(anyhow::Error::from)?;
    store::save_action_plan(&state.db, id, &value).await?;

    Ok(Json(plan))
}

/// POST /api/v1/canvas
pub async fn handle_canvas_state(Json(machine): Json<CanvasStateMachine>) -> Json<CanvasResponse> {
    Json(CanvasResponse {
        state: get_active_canvas_state(&machine),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn row(phase: &str, insights: &[&str]) -> ConversationRow {
        ConversationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            phase: phase.to_string(),
            insights: insights.iter().map(|s| s.to_string()).collect(),
            confidence: 0,
            scenarios: None,
            action_plan: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn message(role: &str, content: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stored_phase_parses_display_name() {
        assert_eq!(
            stored_phase(&row("Solution Design", &[])).unwrap(),
            Phase::SolutionDesign
        );
    }

    #[test]
    fn test_stored_phase_rejects_unknown_label() {
        assert!(matches!(
            stored_phase(&row("Bogus", &[])),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_stored_insights_skip_malformed() {
        let insights = stored_insights(&row("Context", &["Företag: Acme AB", "ingen kategori"]));
        assert_eq!(insights, vec![Insight::new("Företag", "Acme AB")]);
    }

    #[test]
    fn test_history_keeps_order_and_drops_unknown_roles() {
        let rows = vec![
            message("user", "Hej"),
            message("system", "ignoreras"),
            message("assistant", "Hej! Berätta om företaget."),
        ];
        let history = history_from_rows(&rows);
        assert_eq!(
            history,
            vec![
                ChatMessage::user("Hej"),
                ChatMessage::assistant("Hej! Berätta om företaget.")
            ]
        );
    }

    #[test]
    fn test_stored_scenarios_tolerates_bad_json() {
        let mut r = row("Solution Design", &[]);
        r.scenarios = Some(json!({"not": "a list"}));
        assert!(stored_scenarios(&r).is_empty());
    }

    #[tokio::test]
    async fn test_canvas_handler_evaluates_snapshot() {
        let machine: CanvasStateMachine = serde_json::from_value(json!({
            "is_researching": true,
            "current_phase": "Context",
            "confidence": 40
        }))
        .unwrap();
        let Json(resp) = handle_canvas_state(Json(machine)).await;
        assert_eq!(resp.state, CanvasState::Research);
    }
}
