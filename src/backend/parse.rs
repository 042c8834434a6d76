//! Reply parsing: models are asked for bare JSON but often wrap it in prose or
//! code fences, so a strict parse is followed by a `{ ... }` extraction pass.

use serde_json::Value;

use super::{ReplyObject, Unavailable};

/// Parse a structured reply: strict JSON first, then the substring between the
/// first `{` and the last `}`. Only JSON objects are accepted.
pub fn parse_structured_reply(text: &str) -> Result<ReplyObject, Unavailable> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return into_object(v);
    }

    let start = trimmed.find('{').ok_or(Unavailable::MalformedReply)?;
    let end = trimmed.rfind('}').ok_or(Unavailable::MalformedReply)?;
    if end <= start {
        return Err(Unavailable::MalformedReply);
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .map_err(|_| Unavailable::MalformedReply)
        .and_then(into_object)
}

fn into_object(v: Value) -> Result<ReplyObject, Unavailable> {
    match v {
        Value::Object(map) => Ok(map),
        _ => Err(Unavailable::MalformedReply),
    }
}
