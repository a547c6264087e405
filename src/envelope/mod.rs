//! Response envelope decoding
//!
//! DbFlare answers either with a bare JSON value or with a wrapper object
//! (`{"data": ...}` / `{"result": ...}`, optionally with `total` and
//! `errors` fields). This module applies the HTTP status gate, parses the
//! raw body into a root element, and bubbles service-reported errors before
//! any payload unwrapping happens.

use crate::error::{Error, Result};
use serde_json::Value;
use tracing::debug;


/// Extract the root JSON element from a raw response.
///
/// - 2xx: parse the body; an empty body or JSON `null` is a valid empty
///   result (`Ok(None)`).
/// - 401: `Error::Unauthorized`, so callers can trigger re-authentication.
/// - any other status: service errors embedded in the body win over the
///   plain transport error.
pub fn decode(status: u16, body: &[u8]) -> Result<Option<Value>> {
    if status == 401 {
        return Err(Error::Unauthorized);
    }

    if (200..=299).contains(&status) {
        return parse_root(body);
    }

    // Non-2xx: the body may still carry a structured error list
    if let Ok(Some(root)) = parse_root(body) {
        bubble_errors(&root)?;
    }
    Err(Error::transport(
        status,
        String::from_utf8_lossy(body).into_owned(),
    ))
}

fn parse_root(body: &[u8]) -> Result<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let root: Value = serde_json::from_slice(body)?;
    debug!(kind = json_kind(&root), "decoded response root");
    match root {
        Value::Null => Ok(None),
        other => Ok(Some(other)),
    }
}

/// Raise `Error::Service` if the element is an object with a non-empty
/// `errors` array.
///
/// Runs on every object-shaped root, in every coercion path, before payload
/// unwrapping. Non-string entries in the array are skipped; an array that
/// yields no strings does not short-circuit.
pub fn bubble_errors(root: &Value) -> Result<()> {
    let Some(entries) = root.get("errors").and_then(Value::as_array) else {
        return Ok(());
    };
    let messages: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect();
    if messages.is_empty() {
        return Ok(());
    }
    Err(Error::service(messages))
}

/// Human-readable name for a JSON value's kind, used in mismatch errors
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
