//! The rich-type envelope. Converts between [`Value`] (which can carry
//! `Date`/`Map`/`Set`/`Error` directly) and plain `serde_json::Value` (the
//! only thing that can actually cross an HTTP boundary as JSON), using
//! `{ "__type": ..., "value": ... }` markers for the rich scalars.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as Json};

use crate::value::{RichError, Value};

const TYPE_KEY: &str = "__type";
const VALUE_KEY: &str = "value";

const TYPE_DATE: &str = "Date";
const TYPE_MAP: &str = "Map";
const TYPE_SET: &str = "Set";
const TYPE_ERROR: &str = "Error";

/// Normalizes a temporal instant to millisecond-precision RFC 3339 on the
/// wire, so two instants that differ only below millisecond resolution
/// compare equal after a round trip. Strings that don't parse as a valid
/// instant are passed through unchanged rather than rejected — the
/// envelope never fails on malformed input.
fn normalize_instant(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|_| iso.to_string())
}

/// `processForSerialization`: recursively turns a [`Value`] into wire-safe
/// JSON, wrapping rich scalars in their envelope and leaving plain
/// records/sequences/scalars as direct structural counterparts.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null | Value::Undefined => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        // `Value::Number` already carries a `serde_json::Number`, so this is
        // a direct passthrough rather than a float round-trip — an upstream
        // integer stays an integer on the wire.
        Value::Number(n) => Json::Number(n.clone()),
        Value::Bigint(s) => Json::String(s.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Object(fields) => {
            let mut map = Map::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(k.clone(), to_json(v));
            }
            Json::Object(map)
        }
        Value::Date(iso) => envelope(TYPE_DATE, Json::String(normalize_instant(iso))),
        Value::Map(entries) => {
            let pairs: Vec<Json> = entries
                .iter()
                .map(|(k, v)| Json::Array(vec![to_json(k), to_json(v)]))
                .collect();
            envelope(TYPE_MAP, Json::Array(pairs))
        }
        Value::Set(items) => envelope(TYPE_SET, Json::Array(items.iter().map(to_json).collect())),
        Value::Error(err) => {
            let mut map = Map::new();
            map.insert("message".into(), Json::String(err.message.clone()));
            map.insert("name".into(), Json::String(err.name.clone()));
            if let Some(stack) = &err.stack {
                map.insert("stack".into(), Json::String(stack.clone()));
            }
            envelope(TYPE_ERROR, Json::Object(map))
        }
    }
}

fn envelope(type_name: &str, value: Json) -> Json {
    let mut map = Map::with_capacity(2);
    map.insert(TYPE_KEY.to_string(), Json::String(type_name.to_string()));
    map.insert(VALUE_KEY.to_string(), value);
    Json::Object(map)
}

/// Inverse of [`to_json`]. An object bearing an unrecognized `__type`
/// marker is not an error: this is an explicit forward-compatibility rule,
/// so we return its `.value` payload converted as-is rather than failing.
pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.clone()),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(from_json).collect()),
        Json::Object(map) => from_object(map),
    }
}

fn from_object(map: &Map<String, Json>) -> Value {
    let Some(Json::String(type_name)) = map.get(TYPE_KEY) else {
        return Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        );
    };
    let Some(inner) = map.get(VALUE_KEY) else {
        return Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        );
    };

    match type_name.as_str() {
        TYPE_DATE => match inner {
            Json::String(iso) => Value::Date(iso.clone()),
            other => from_json(other),
        },
        TYPE_MAP => match inner {
            Json::Array(pairs) => Value::Map(
                pairs
                    .iter()
                    .filter_map(|pair| match pair {
                        Json::Array(kv) if kv.len() == 2 => {
                            Some((from_json(&kv[0]), from_json(&kv[1])))
                        }
                        _ => None,
                    })
                    .collect(),
            ),
            other => from_json(other),
        },
        TYPE_SET => match inner {
            Json::Array(items) => Value::Set(items.iter().map(from_json).collect()),
            other => from_json(other),
        },
        TYPE_ERROR => match inner {
            Json::Object(err_map) => Value::Error(RichError {
                message: err_map
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                name: err_map
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                stack: err_map
                    .get("stack")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
            }),
            other => from_json(other),
        },
        // Forward-compatibility: unknown __type, pass the payload through.
        _ => from_json(inner),
    }
}
