// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every conversational system prompt so the reply
/// ends with a machine-readable insight list.
pub const INSIGHT_FORMAT_INSTRUCTION: &str = "\
    After your reply to the user, write the marker ###INSIGHTS### on its own line, \
    followed by every NEW fact you learned in this turn as a bullet list. \
    Each bullet MUST have the form `- Kategori: konkret beskrivning`, using one of the \
    categories listed for the current phase. \
    Never emit placeholders such as 'okänd', 'TBD' or 'inte angivet'; omit the bullet instead. \
    If you learned nothing new, write the marker and no bullets.";

/// Instruction that keeps the assistant from inventing facts about the client.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only record insights the user actually stated or clearly confirmed. \
    Do NOT infer budgets, headcounts or timelines the user has not given.";
