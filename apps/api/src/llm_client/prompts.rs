// Shared prompt constants and prompt-building utilities.
// Document-specific prompts live in generation/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces the JSON envelope every generation call returns.
pub const JSON_ENVELOPE_SYSTEM: &str = "You MUST respond with a single valid JSON object \
    of the form {\"data\": <document>, \"rationale\": \"<why the document looks the way it does>\"}. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include apologies.";

/// Common instruction appended to all generation prompts.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Work exclusively with the candidate data provided. \
    Do NOT create, infer, or extrapolate details that are not present in it. \
    If the data does not support a claim, omit it entirely.";

/// Keeps contact details out of generated documents.
pub const NO_PERSONAL_DATA_INSTRUCTION: &str = "\
    Never output names, addresses, e-mail addresses, phone numbers, or profile links. \
    Contact details are attached by the application after you finish.";

/// Preamble sent as the first user turn of every edit conversation.
pub const EDIT_CONVERSATION_PREAMBLE: &str = "\
    Below is the history of this document: your previous versions and any \
    versions I edited myself. The most recent version is the starting point.";
