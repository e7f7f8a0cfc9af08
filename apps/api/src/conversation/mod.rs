// Conversation module: one advisor turn at a time, persisted per conversation.
// turn.rs is the pipeline; handlers.rs and store.rs wrap it with HTTP and Postgres.

pub mod handlers;
pub mod prompts;
pub mod store;
pub mod turn;
