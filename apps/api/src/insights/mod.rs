// Insight pipeline: parse model output, filter and merge insights,
// score phase confidence. Pure and synchronous; no I/O here.

pub mod confidence;
pub mod dedup;
pub mod models;
pub mod parser;
pub mod validation;

pub use confidence::{calculate_confidence, ConfidenceResult};
pub use models::{Insight, Phase};
