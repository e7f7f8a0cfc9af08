pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::conversation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Conversation API
        .route(
            "/api/v1/conversations",
            post(handlers::handle_create_conversation),
        )
        .route(
            "/api/v1/conversations/:id",
            get(handlers::handle_get_conversation),
        )
        .route(
            "/api/v1/conversations/:id/messages",
            post(handlers::handle_send_message),
        )
        .route(
            "/api/v1/conversations/:id/advance",
            post(handlers::handle_advance_phase),
        )
        .route(
            "/api/v1/conversations/:id/scenarios",
            post(handlers::handle_generate_scenarios),
        )
        .route(
            "/api/v1/conversations/:id/action-plan",
            post(handlers::handle_generate_action_plan),
        )
        // Canvas API
        .route("/api/v1/canvas", post(handlers::handle_canvas_state))
        .with_state(state)
}
