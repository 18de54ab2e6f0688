use crate::value::Value;
use std::cmp::Ordering;

/// Equality used by the interpreter and the session cache.
///
/// `Null` equals only `Null`. Integers and floats compare numerically;
/// every other pair must share a variant.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => widen(*a) == *b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        _ => left == right,
    }
}

/// Ordering for same-family values.
///
/// Returns `None` when either side is `Null` or the families differ;
/// callers treat that as "not satisfied".
#[must_use]
pub fn order_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => widen(*a).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&widen(*b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss)]
const fn widen(value: i64) -> f64 {
    value as f64
}
