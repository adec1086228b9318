//! JSON utility functions

use std::cmp::Ordering;

use serde_json::{Number, Value as JsonValue};

/// Largest integer an f64 holds exactly (2^53)
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Resolve a dotted path (`a.b.0.c`) inside a JSON value.
///
/// Object segments are looked up by key; on arrays a segment is used as an
/// index when it parses as one. Returns `None` as soon as a segment is missing.
pub fn resolve_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(value, |current, segment| match current {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Strict equality: same JSON type and same value.
///
/// Numbers compare by numeric value so `1` and `1.0` are equal; no other
/// cross-type coercion happens.
pub fn strict_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// Ordering between two JSON values of the same comparable type.
///
/// Numbers, strings and booleans are comparable with their own kind. Every
/// other pairing (including NaN-like numbers) yields `None`.
pub fn compare_values(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// String form used by text operators.
///
/// Strings are returned as-is, numbers and booleans in display form, null as
/// the empty string, arrays and objects as compact JSON. Whole floats print
/// without a fraction, so `1.0` reads as `1`.
pub fn to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => canonical_number(n).to_string(),
        other => to_canonical_json(other),
    }
}

/// Compact JSON with whole floats written as integers (`30.0` becomes `30`).
pub fn to_canonical_json(value: &JsonValue) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => JsonValue::Number(canonical_number(n)),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn canonical_number(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_F64_INT => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

/// Null, missing or empty string.
pub fn is_blank(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
