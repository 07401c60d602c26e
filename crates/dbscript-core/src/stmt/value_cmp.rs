use super::Value;

use std::cmp::Ordering;

impl Value {
    /// Equality used when matching key components.
    ///
    /// Integers and floats compare by numeric value, strings and bytes compare
    /// exactly, and `Null` never matches anything (including another `Null`),
    /// so a key with a null component cannot identify a row.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Total order used to sort a row model by one column.
    ///
    /// Nulls sort first, then booleans, numbers, strings and bytes.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::I64(_) | Value::F64(_) => 2,
                Value::String(_) => 3,
                Value::Bytes(_) => 4,
            }
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => rank(a).cmp(&rank(b)),
            },
        }
    }
}

/// Returns `true` if every component of `key` matches the value at the
/// corresponding position of `row`.
pub(crate) fn key_matches(row: &[Value], positions: &[usize], key: &[Value]) -> bool {
    positions.len() == key.len()
        && positions
            .iter()
            .zip(key)
            .all(|(&pos, component)| row.get(pos).is_some_and(|value| value.key_eq(component)))
}
