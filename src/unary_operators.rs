//! Unary operator implementations for the evaluator.
//!
//! Direct enum-based dispatch, same policy as the binary module: an
//! operand without a matching reading yields the empty value.

use crate::value::{convert_to_bool, Value, ValueData};

/// Unary operators of the expression language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `not`
    Not,
    /// `+`
    Plus,
}

/// Evaluate a unary operation using direct pattern matching.
pub fn evaluate_unary(value: Value, op: UnaryOp) -> Value {
    match op {
        // `not` applies to anything through boolean coercion.
        UnaryOp::Not => Value::boolean(!convert_to_bool(&value)),
        UnaryOp::Neg => match value.data() {
            ValueData::Int(n) => n.checked_neg().map_or_else(Value::empty, Value::int),
            ValueData::Double(d) => Value::double(-d),
            _ => Value::empty(),
        },
        UnaryOp::Plus => {
            if matches!(value.data(), ValueData::Int(_) | ValueData::Double(_)) {
                value
            } else {
                Value::empty()
            }
        }
    }
}
