//! Binary operator implementations for the evaluator.
//!
//! The template language's whole operator table lives in one [`BinaryOp`]
//! enum, and evaluation is a match over the operand payload pair. Every
//! supported pairing (integer with integer, promoted numerics, same-width
//! strings, lists) is spelled out here, and whatever has no defined
//! reading falls through to the empty value instead of needing a trait
//! impl somewhere else.
//!
//! A failed operation (type mismatch, zero divisor, overflow) yields the
//! empty value; evaluation never aborts a render. The logical, membership,
//! and width-coercing concatenation operators are handled by the
//! expression layer, which owns short-circuiting and the renderer
//! callback; this module receives only fully evaluated operands.

use std::cmp::Ordering;

use crate::value::{as_number, ListAdapter, Value, ValueData};

/// Binary operators of the expression language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `and` (short-circuit, expression layer).
    And,
    /// `or` (short-circuit, expression layer).
    Or,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (true division)
    Div,
    /// `//` (integer division, truncating toward zero)
    FloorDiv,
    /// `%` (remainder, sign of the dividend)
    Mod,
    /// `**`
    Pow,
    /// `in` (membership, expression layer).
    In,
    /// `~` (string concatenation, expression layer).
    Concat,
}

/// Evaluate a binary operation using direct pattern matching.
///
/// Operands are taken by value so that a temporary left operand's buffer
/// can be reclaimed for the result.
pub fn evaluate_binary(left: Value, right: Value, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Eq => Value::boolean(left.equals(&right)),
        BinaryOp::NotEq => Value::boolean(!left.equals(&right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            match value_order(&left, &right) {
                Some(ordering) => Value::boolean(ordering_matches(ordering, op)),
                None => Value::empty(),
            }
        }
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Mod
        | BinaryOp::Pow => arithmetic(left, right, op),
        BinaryOp::And | BinaryOp::Or | BinaryOp::In | BinaryOp::Concat => Value::empty(),
    }
}

/// Order two values, if they are comparable: numbers with promotion,
/// strings lexicographically, lists element-wise.
pub(crate) fn value_order(left: &Value, right: &Value) -> Option<Ordering> {
    if let (ValueData::Int(a), ValueData::Int(b)) = (left.data(), right.data()) {
        return Some(a.cmp(b));
    }
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_narrow(), right.as_narrow()) {
        return Some(a.cmp(b));
    }
    if let (Some(a), Some(b)) = (left.as_wide(), right.as_wide()) {
        return Some(a.cmp(b));
    }
    match (left.data(), right.data()) {
        (ValueData::Bool(a), ValueData::Bool(b)) => Some(a.cmp(b)),
        (ValueData::List(a), ValueData::List(b)) => list_order(a, b),
        _ => None,
    }
}

fn list_order(a: &ListAdapter, b: &ListAdapter) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match value_order(&x, &y)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(a.len().cmp(&b.len()))
}

fn ordering_matches(ordering: Ordering, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

// Arithmetic

fn arithmetic(left: Value, right: Value, op: BinaryOp) -> Value {
    if let (ValueData::Int(a), ValueData::Int(b)) = (left.data(), right.data()) {
        return int_arithmetic(*a, *b, op);
    }
    if let (Some(a), Some(b)) = (as_number(&left), as_number(&right)) {
        // Mixed operands promote to double.
        return double_arithmetic(a, b, op);
    }
    if op == BinaryOp::Add {
        return concat_add(left, right);
    }
    Value::empty()
}

fn int_arithmetic(a: i64, b: i64, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => a.checked_add(b).map_or_else(Value::empty, Value::int),
        BinaryOp::Sub => a.checked_sub(b).map_or_else(Value::empty, Value::int),
        BinaryOp::Mul => a.checked_mul(b).map_or_else(Value::empty, Value::int),
        // True division always produces a double.
        BinaryOp::Div => {
            if b == 0 {
                Value::empty()
            } else {
                Value::double(a as f64 / b as f64)
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                Value::empty()
            } else {
                Value::int(a / b)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Value::empty()
            } else {
                Value::int(a % b)
            }
        }
        BinaryOp::Pow => int_pow(a, b),
        _ => Value::empty(),
    }
}

fn int_pow(a: i64, b: i64) -> Value {
    if b >= 0 {
        if let Ok(exp) = u32::try_from(b) {
            if let Some(n) = a.checked_pow(exp) {
                return Value::int(n);
            }
        }
    }
    Value::double((a as f64).powf(b as f64))
}

fn double_arithmetic(a: f64, b: f64, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => Value::double(a + b),
        BinaryOp::Sub => Value::double(a - b),
        BinaryOp::Mul => Value::double(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                Value::empty()
            } else {
                Value::double(a / b)
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                Value::empty()
            } else {
                Value::double((a / b).trunc())
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Value::empty()
            } else {
                Value::double(a % b)
            }
        }
        BinaryOp::Pow => Value::double(a.powf(b)),
        _ => Value::empty(),
    }
}

// Concatenating `+`

/// `+` on two same-width strings or two lists concatenates. A temporary
/// left operand with a unique buffer is reclaimed as the result slot.
fn concat_add(left: Value, right: Value) -> Value {
    if left.as_narrow().is_some() && right.as_narrow().is_some() {
        return concat_narrow(left, right);
    }
    if left.as_wide().is_some() && right.as_wide().is_some() {
        return concat_wide(left, right);
    }
    if matches!((left.data(), right.data()), (ValueData::List(_), ValueData::List(_))) {
        return concat_lists(left, right);
    }
    Value::empty()
}

fn concat_narrow(left: Value, right: Value) -> Value {
    let rhs = right.as_narrow().unwrap_or_default().to_string();
    let reuse = left.is_temporary();
    let mut buf = match left.into_data() {
        ValueData::Str(h) if reuse => h.try_into_inner().unwrap_or_else(|h| (*h).clone()),
        ValueData::Str(h) => (*h).clone(),
        ValueData::StrView(v) => v.as_str().to_string(),
        ValueData::Target(t) => match &*t {
            crate::value::TargetString::Narrow(s) => s.clone(),
            crate::value::TargetString::Wide(_) => String::new(),
        },
        _ => String::new(),
    };
    buf.push_str(&rhs);
    Value::string(buf).with_temporary(true)
}

fn concat_wide(left: Value, right: Value) -> Value {
    let rhs = right.as_wide().unwrap_or_default().to_vec();
    let reuse = left.is_temporary();
    let mut buf = match left.into_data() {
        ValueData::Wide(h) if reuse => h.try_into_inner().unwrap_or_else(|h| (*h).clone()),
        ValueData::Wide(h) => (*h).clone(),
        ValueData::WideView(v) => v.as_slice().to_vec(),
        ValueData::Target(t) => match &*t {
            crate::value::TargetString::Wide(w) => w.clone(),
            crate::value::TargetString::Narrow(_) => Vec::new(),
        },
        _ => Vec::new(),
    };
    buf.extend_from_slice(&rhs);
    Value::wide(buf).with_temporary(true)
}

fn concat_lists(left: Value, right: Value) -> Value {
    let ValueData::List(rhs) = right.into_data() else {
        return Value::empty();
    };
    let reuse = left.is_temporary();
    let mut items = match left.into_data() {
        ValueData::List(ListAdapter::Materialized(h)) if reuse => {
            h.try_into_inner().unwrap_or_else(|h| (*h).clone())
        }
        ValueData::List(adapter) => adapter.iter().collect(),
        _ => return Value::empty(),
    };
    items.extend(rhs.iter());
    Value::list(items).with_temporary(true)
}
