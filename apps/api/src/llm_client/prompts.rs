// Shared prompt constants and prompt-building utilities.
// Each feature module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to prose prompts so answers stay short enough for a dashboard card.
pub const CONCISE_INSTRUCTION: &str = "\
    Answer in at most five short sentences of plain text. \
    Do not use markdown headings or bullet symbols. \
    Only refer to facts present in the data provided.";

/// Joins a system persona with the JSON-only fragment.
pub fn json_system(persona: &str) -> String {
    format!("{persona} {JSON_ONLY_SYSTEM}")
}
