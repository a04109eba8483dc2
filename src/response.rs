//! Defensive parsing of model output.
//!
//! The model is asked for a bare JSON object but its reply is untrusted
//! text. Parsing tries, in order: the reply as-is, the reply with a
//! surrounding code fence removed, and the substring from the first `{` to
//! the last `}`. Values are coerced to strings.

use serde_json::{Map, Value};

use crate::placeholder::FieldMapping;

/// Which attempt produced the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    Direct,
    FenceStripped,
    BraceExtracted,
}

/// Parse a model reply into a field mapping.
///
/// Returns the reason for failure when no attempt yields a JSON object.
pub fn parse_mapping(raw: &str) -> Result<(FieldMapping, Repair), String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("model returned an empty response".into());
    }

    let first_error = match parse_object(text) {
        Ok(map) => return Ok((map, Repair::Direct)),
        Err(e) => e,
    };

    if let Some(inner) = strip_fence(text) {
        if let Ok(map) = parse_object(inner) {
            return Ok((map, Repair::FenceStripped));
        }
    }

    if let Some(inner) = brace_span(text) {
        if let Ok(map) = parse_object(inner) {
            return Ok((map, Repair::BraceExtracted));
        }
    }

    Err(format!("model response is not a JSON object: {first_error}"))
}

fn parse_object(text: &str) -> Result<FieldMapping, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(coerce(map)),
        Ok(other) => Err(format!("expected an object, got {}", kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Stringify every value: strings verbatim, `null` as empty, anything
/// else as its compact JSON.
fn coerce(map: Map<String, Value>) -> FieldMapping {
    map.into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, v)
        })
        .collect()
}

/// Remove a leading code fence (with optional language tag) and/or a
/// trailing one. Returns `None` when there is no fence at either end.
fn strip_fence(text: &str) -> Option<&str> {
    let mut inner = text;
    let mut stripped = false;
    if let Some(rest) = inner.strip_prefix("```") {
        // Drop the info string, e.g. "json", up to the end of the line.
        inner = match rest.find('\n') {
            Some(nl) => &rest[nl + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
        stripped = true;
    }
    if let Some(rest) = inner.trim_end().strip_suffix("```") {
        inner = rest;
        stripped = true;
    }
    stripped.then(|| inner.trim())
}

/// The span from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
