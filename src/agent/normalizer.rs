//! Response normalization
//!
//! Turns whatever a provider returned into the content string shown to the
//! user. Malformed payloads degrade to their raw text; this never fails.

use serde_json::Value;

use crate::core::RawResponse;

/// Extract clean content from an agent response
pub fn normalize(response: &RawResponse) -> String {
    match response {
        RawResponse::Text(text) => embedded_content(text).unwrap_or_else(|| text.clone()),
        RawResponse::Structured(value) => match value {
            Value::Object(map) => match map.get("content") {
                Some(content) => render(content),
                None => value.to_string(),
            },
            other => render(other),
        },
    }
}

/// `content` of a JSON object embedded in text, if there is one
fn embedded_content(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map.get("content").map(render),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
