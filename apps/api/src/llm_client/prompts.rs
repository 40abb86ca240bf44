// Prompt fragments owned by the LLM client itself.
// Scoring prompts live in scoring::prompts.

/// Prepended to every prompt sent through `send_message_with_json_response`.
pub const JSON_ONLY_PREFIX: &str = "Answer to the following request only in a valid JSON format, \
    specified next. Do not include extra text: ";

/// The single repair turn sent when a reply cannot be parsed as a JSON object.
pub const REPAIR_MESSAGE: &str = "The JSON response is not valid. \
    Please fix the JSON response and send it back. Do not include extra text.";

/// Value of the `error` key in the sentinel mapping returned after a failed repair.
pub const INVALID_JSON_SENTINEL: &str = "Invalid JSON response from the model";
