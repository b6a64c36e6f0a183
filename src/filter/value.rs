use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Name of a JSON value's type, as used in error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Structural equality where integers and floats compare numerically
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    x.as_f64() == y.as_f64()
}

/// Ordering between two values, or `None` when the pair is not orderable
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Hashable projection of a scalar JSON value, used for `in_` sets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SetKey {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(u64),
    Str(String),
}

impl SetKey {
    /// Returns `None` for lists and objects
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(SetKey::Null),
            Value::Bool(b) => Some(SetKey::Bool(*b)),
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Some(SetKey::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return SetKey::Int(i);
        }
        if let Some(u) = n.as_u64() {
            return SetKey::UInt(u);
        }
        let f = n.as_f64().unwrap_or(f64::NAN);
        // integral floats hash like the integer they equal
        if f.fract() != 0.0 {
            SetKey::Float(f.to_bits())
        } else if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            SetKey::Int(f as i64)
        } else if f >= 0.0 && f < u64::MAX as f64 {
            SetKey::UInt(f as u64)
        } else {
            SetKey::Float(f.to_bits())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_and_float_are_equal() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!values_equal(&json!(1), &json!("1")));
        assert!(!values_equal(&json!(true), &json!(1)));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(2), &json!(1.5)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!("abc"), &json!("abd")), Some(Ordering::Less));
        assert_eq!(compare_values(&json!(false), &json!(true)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!("1"), &json!(1)), None);
        assert_eq!(compare_values(&json!(null), &json!(null)), None);
    }

    #[test]
    fn test_set_key_normalizes_numbers() {
        assert_eq!(SetKey::from_value(&json!(3.0)), SetKey::from_value(&json!(3)));
        assert_ne!(SetKey::from_value(&json!(3.5)), SetKey::from_value(&json!(3)));
        assert_eq!(SetKey::from_value(&json!([1])), None);
    }

    #[test]
    fn test_set_key_matches_equality_beyond_i64() {
        let big_int = json!(10_000_000_000_000_000_000u64);
        let big_float = json!(1e19);
        assert!(values_equal(&big_int, &big_float));
        assert_eq!(SetKey::from_value(&big_int), SetKey::from_value(&big_float));
        assert_eq!(
            SetKey::from_value(&big_float),
            Some(SetKey::UInt(10_000_000_000_000_000_000))
        );
    }
}
