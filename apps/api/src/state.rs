use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::conversation::turn::TurnSettings;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Completion backend. `LlmClient` in production.
    pub llm: Arc<dyn CompletionService>,
    /// Turn pipeline tunables derived from `Config`.
    pub turn_settings: TurnSettings,
}

impl AppState {
    pub fn new(db: PgPool, llm: Arc<dyn CompletionService>, config: &Config) -> Self {
        Self {
            db,
            llm,
            turn_settings: TurnSettings::from(config),
        }
    }
}
