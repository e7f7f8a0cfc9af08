// Auxiliary market research: entity extraction from insights, per-phase
// gating and query templates, and a bounded concurrent runner.

pub mod entities;
pub mod prompts;
pub mod runner;
pub mod trigger;

pub use entities::{extract_entities, EntityType, ExtractedEntities};
pub use runner::{format_research_context, run_research, ResearchOutcome, ResearchSession};
pub use trigger::{research_entities, research_queries, should_trigger_research, ConversationState};
