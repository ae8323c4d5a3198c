// Shared prompt constants.
// Each capability's own template lives in pipeline/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only, matching the requested response schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every template that produces a score.
pub const SCORE_INSTRUCTION: &str = "\
    Every score MUST be an integer between 0 and 100 inclusive. \
    Never return a score outside that range.";

/// Instruction appended to templates whose output is shown in the user's language.
pub const LANGUAGE_INSTRUCTION: &str = "\
    Write every piece of feedback text in the requested language. \
    Keep JSON field names in English exactly as specified.";
