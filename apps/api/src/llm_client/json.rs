//! Recovers a JSON value from free-form model text.
//!
//! `normalize_json_reply` applies these rules, in order:
//! 1. trim surrounding whitespace
//! 2. strip leading and trailing runs of backticks (code fences)
//! 3. drop a leading `json` language tag, case-insensitive
//! 4. if the text opens with `{` or `[`, cut at a closing fence that follows
//!    the payload, dropping any prose after it
//! 5. otherwise keep the span from the first `{` to the last `}` when one exists
//!
//! `parse_json_reply` parses the normalized text strictly first. Only when that
//! fails and the text contains single quotes does it retry with every `'`
//! replaced by `"`, so apostrophes inside valid JSON strings survive.

use serde_json::Value;

pub fn normalize_json_reply(raw: &str) -> &str {
    let text = raw.trim().trim_matches('`').trim();

    let text = match text.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => text[4..].trim_start(),
        _ => text,
    };

    if text.starts_with('{') || text.starts_with('[') {
        return match text.find("```") {
            Some(fence) => text[..fence].trim_end(),
            None => text,
        };
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

pub fn parse_json_reply(raw: &str) -> Result<Value, serde_json::Error> {
    let text = normalize_json_reply(raw);
    serde_json::from_str(text).or_else(|strict_err| {
        if text.contains('\'') {
            serde_json::from_str(&text.replace('\'', "\"")).map_err(|_| strict_err)
        } else {
            Err(strict_err)
        }
    })
}
