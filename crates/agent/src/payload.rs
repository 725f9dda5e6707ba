//! Step payload adapter
//!
//! The reasoning engine's `model` payloads come in several shapes: a mapping
//! with a `messages` list (or a single message under `messages`), a bare list
//! of messages, or one message on its own. Everything that inspects payload
//! structure goes through this module.

use serde_json::Value;

/// Flatten a step payload into its messages
pub fn normalize_messages(payload: &Value) -> Vec<&Value> {
    let messages = match payload {
        Value::Object(map) => match map.get("messages") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            Some(_) => Vec::new(),
            None => vec![payload],
        },
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    };

    messages.into_iter().filter(|m| m.is_object()).collect()
}

/// Whether any message in the step invokes a tool
pub fn has_tool_calls(payload: &Value) -> bool {
    normalize_messages(payload).into_iter().any(|msg| {
        msg.get("tool_calls").is_some_and(is_truthy)
            || content_parts(msg).any(|part| part.get("tool_calls").is_some_and(is_truthy))
    })
}

/// Ids of every tool call in the step; `None` for a call without an id
pub fn tool_call_ids(payload: &Value) -> Vec<Option<String>> {
    let mut ids = Vec::new();
    for msg in normalize_messages(payload) {
        let calls = std::iter::once(msg)
            .chain(content_parts(msg))
            .filter_map(|holder| holder.get("tool_calls"))
            .filter(|calls| is_truthy(calls));

        for calls in calls {
            match calls {
                Value::Array(items) => ids.extend(items.iter().map(call_id)),
                other => ids.push(call_id(other)),
            }
        }
    }
    ids
}

/// Terminal text of the step, read from the first message.
///
/// A string `content` is returned as-is; list content yields the
/// concatenated text parts. `None` when the first message has no text.
pub fn final_text(payload: &Value) -> Option<String> {
    let first = normalize_messages(payload).into_iter().next()?;

    match first.get("content")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts.iter().filter_map(part_text).collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            }
        }
        _ => None,
    }
}

fn content_parts(msg: &Value) -> impl Iterator<Item = &Value> {
    msg.get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|part| part.is_object())
}

fn part_text(part: &Value) -> Option<&str> {
    match part {
        Value::String(text) => Some(text),
        Value::Object(map) => {
            let is_text = map
                .get("type")
                .and_then(Value::as_str)
                .map_or(true, |t| t == "text");
            if is_text {
                map.get("text").and_then(Value::as_str)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn call_id(call: &Value) -> Option<String> {
    call.get("id").and_then(Value::as_str).map(str::to_string)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
