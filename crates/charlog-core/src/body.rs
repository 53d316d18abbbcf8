//! Display helpers for captured request and response bodies.
//!
//! Proxied APIs often return JSON whose string fields hold more JSON
//! (double-encoded payloads). Those strings are expanded before printing so
//! the whole body reads as one document.

use serde_json::Value;

/// How many levels of nested JSON strings are expanded
pub const MAX_NESTED_DEPTH: usize = 3;

/// Pretty-print a body, expanding JSON embedded in string values
pub fn prettify(body: &Value) -> String {
    let expanded = expand(body.clone(), MAX_NESTED_DEPTH, 0);
    match &expanded {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Shorten text for table cells
///
/// Cuts at the last line break before `max_chars` when there is one, so a
/// pretty-printed document is not split mid-line.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    match head.rfind('\n') {
        Some(line_end) if line_end > 0 => format!("{}\n...", &text[..line_end]),
        _ => format!("{}...", head),
    }
}

fn expand(value: Value, max_depth: usize, depth: usize) -> Value {
    if depth >= max_depth {
        return value;
    }

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, expand(v, max_depth, depth + 1)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| expand(v, max_depth, depth + 1))
                .collect(),
        ),
        Value::String(text) => match parse_embedded(&text) {
            Some(parsed) => expand(parsed, max_depth, depth + 1),
            None => Value::String(text),
        },
        other => other,
    }
}

fn parse_embedded(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let looks_like_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !looks_like_json {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
