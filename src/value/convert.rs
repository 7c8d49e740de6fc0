//! Scalar coercions.
//!
//! The evaluator never fails on a bad coercion; it falls back to a caller
//! supplied default (integers) or to container truthiness (booleans).

use super::{Value, ValueData};

/// Coerce a value to a boolean.
///
/// Empty is false, numbers are true when nonzero, strings and containers
/// when non-empty, callables always.
pub fn convert_to_bool(value: &Value) -> bool {
    match value.data() {
        ValueData::Empty => false,
        ValueData::Bool(b) => *b,
        ValueData::Int(n) => *n != 0,
        ValueData::Double(d) => *d != 0.0,
        ValueData::Str(s) => !s.is_empty(),
        ValueData::StrView(v) => !v.as_str().is_empty(),
        ValueData::Wide(w) => !w.is_empty(),
        ValueData::WideView(v) => !v.as_slice().is_empty(),
        ValueData::List(items) => !items.is_empty(),
        ValueData::Map(map) => !map.is_empty(),
        ValueData::Callable(_) => true,
        ValueData::Target(t) => !t.is_empty(),
    }
}

/// Coerce a value to an integer, with `default` for anything that has no
/// integer reading. Doubles truncate toward zero; strings parse as an
/// integer, then as a double.
pub fn convert_to_int(value: &Value, default: i64) -> i64 {
    match value.data() {
        ValueData::Empty => default,
        ValueData::Bool(b) => i64::from(*b),
        ValueData::Int(n) => *n,
        ValueData::Double(d) => *d as i64,
        _ => match value.as_narrow() {
            Some(s) => parse_int(s).unwrap_or(default),
            None => value
                .as_wide()
                .and_then(|w| parse_int(&w.iter().collect::<String>()))
                .unwrap_or(default),
        },
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    s.parse::<f64>().ok().map(|d| d as i64)
}

/// Numeric reading of a value, if it has one.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value.data() {
        ValueData::Int(n) => Some(*n as f64),
        ValueData::Double(d) => Some(*d),
        _ => None,
    }
}
