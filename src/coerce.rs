//! Best-effort conversion between basic scalar kinds.
//!
//! Coercion goes numeric ↔ string ↔ boolean only. Sequences and mappings
//! never coerce to a scalar, and scalars never coerce to them.

use serde_json::Value;

use crate::data::Data;
use crate::descriptor::ScalarKind;

/// Runtime kind of a decoded JSON node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl SourceKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_i64() => Self::Int,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn as_scalar(self) -> Option<ScalarKind> {
        match self {
            Self::Null => Some(ScalarKind::Null),
            Self::Bool => Some(ScalarKind::Bool),
            Self::Int => Some(ScalarKind::Int),
            Self::Float => Some(ScalarKind::Float),
            Self::String => Some(ScalarKind::String),
            Self::Array | Self::Object => None,
        }
    }
}

/// Converts `value` to `target`, or `None` when that is not possible.
/// Values already of the target kind pass through unchanged.
pub fn coerce_scalar(value: &Value, target: ScalarKind) -> Option<Data> {
    let source = SourceKind::of(value).as_scalar()?;
    if source == target {
        return Some(Data::from_json(value));
    }
    match target {
        // nothing else becomes null
        ScalarKind::Null => None,
        ScalarKind::Bool => to_bool(value).map(Data::Bool),
        ScalarKind::Int => to_int(value).map(Data::Int),
        ScalarKind::Float => to_float(value).map(Data::Float),
        ScalarKind::String => to_string(value).map(Data::String),
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| parse_number(s).and_then(integral))
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite decimal number; rejects `inf`/`nan` spellings `f64::from_str` allows.
fn parse_number(s: &str) -> Option<f64> {
    let plausible = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plausible {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// A key made only of a number (`"0"`, `"12"`, `"-1.5"`, `"1e3"`).
/// Such keys come from sequences coerced to objects and are never type-checked.
pub fn is_numeric_key(key: &str) -> bool {
    parse_number(key.trim()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_coerce_to_numbers() {
        assert_eq!(coerce_scalar(&json!("42"), ScalarKind::Int), Some(Data::Int(42)));
        assert_eq!(coerce_scalar(&json!(" 7 "), ScalarKind::Int), Some(Data::Int(7)));
        assert_eq!(coerce_scalar(&json!("3.0"), ScalarKind::Int), Some(Data::Int(3)));
        assert_eq!(coerce_scalar(&json!("2.5"), ScalarKind::Float), Some(Data::Float(2.5)));
        assert_eq!(coerce_scalar(&json!("x"), ScalarKind::Int), None);
        assert_eq!(coerce_scalar(&json!("2.5"), ScalarKind::Int), None);
        assert_eq!(coerce_scalar(&json!("inf"), ScalarKind::Float), None);
    }

    #[test]
    fn numbers_and_bools_cross_over() {
        assert_eq!(coerce_scalar(&json!(5), ScalarKind::String), Some(Data::from("5")));
        assert_eq!(coerce_scalar(&json!(true), ScalarKind::String), Some(Data::from("true")));
        assert_eq!(coerce_scalar(&json!(0), ScalarKind::Bool), Some(Data::Bool(false)));
        assert_eq!(coerce_scalar(&json!("true"), ScalarKind::Bool), Some(Data::Bool(true)));
        assert_eq!(coerce_scalar(&json!("maybe"), ScalarKind::Bool), None);
        assert_eq!(coerce_scalar(&json!(1), ScalarKind::Float), Some(Data::Float(1.0)));
        assert_eq!(coerce_scalar(&json!(2.0), ScalarKind::Int), Some(Data::Int(2)));
    }

    #[test]
    fn structures_and_null_never_coerce() {
        assert_eq!(coerce_scalar(&json!([1]), ScalarKind::Int), None);
        assert_eq!(coerce_scalar(&json!({"a": 1}), ScalarKind::String), None);
        assert_eq!(coerce_scalar(&json!(null), ScalarKind::String), None);
        assert_eq!(coerce_scalar(&json!(0), ScalarKind::Null), None);
        assert_eq!(coerce_scalar(&json!(null), ScalarKind::Null), Some(Data::Null));
    }

    #[test]
    fn numeric_keys() {
        assert!(is_numeric_key("0"));
        assert!(is_numeric_key("-1.5"));
        assert!(!is_numeric_key("name"));
        assert!(!is_numeric_key(""));
        assert!(!is_numeric_key("nan"));
        assert!(is_numeric_key(" 1"));
        assert!(is_numeric_key("1 "));
        assert!(is_numeric_key("\n2\t"));
        assert!(!is_numeric_key(" "));
    }
}
