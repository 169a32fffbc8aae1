//! Type coercion and constraint validation for preference values.
//!
//! Coercion always runs before validation, and a coercion failure stops the
//! check before any constraint is looked at. `null` is never coerced into a
//! value; it only fails validation when the preference is required.

use crate::schema::{Pref, ValueKind};
use crate::Result;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// A raw value could not be converted to the preference's value kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Cannot coerce {value} to {expected} for '{key}'")]
pub struct CoercionError {
    pub key: String,
    pub value: Value,
    pub expected: ValueKind,
}

/// Which side of a numeric range was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Inclusive lower bound (`ge`).
    Lower,
    /// Inclusive upper bound (`le`).
    Upper,
}

impl Bound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bound::Lower => ">=",
            Bound::Upper => "<=",
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A coerced value violates a declared constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Preference '{key}' is required")]
    RequiredMissing { key: String },

    #[error("Value {value} for '{key}' must be {bound} {limit}")]
    OutOfRange {
        key: String,
        value: Value,
        bound: Bound,
        limit: Value,
    },

    #[error("Value for '{key}' exceeds max length of {max_length}")]
    TooLong { key: String, max_length: usize },

    #[error("Invalid choice {value} for '{key}'. Valid choices: {}", .valid.join(", "))]
    InvalidChoice {
        key: String,
        value: Value,
        valid: Vec<String>,
    },
}

impl ValidationError {
    /// Key of the preference that failed validation.
    pub fn key(&self) -> &str {
        match self {
            ValidationError::RequiredMissing { key }
            | ValidationError::OutOfRange { key, .. }
            | ValidationError::TooLong { key, .. }
            | ValidationError::InvalidChoice { key, .. } => key,
        }
    }
}

/// Coerce a raw value to the preference's value kind.
pub fn coerce_value(value: &Value, pref: &Pref) -> std::result::Result<Value, CoercionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let fail = || CoercionError {
        key: pref.key().to_string(),
        value: value.clone(),
        expected: pref.kind(),
    };

    match pref.kind() {
        ValueKind::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            other => Ok(Value::Bool(is_truthy(other))),
        },
        ValueKind::Integer => coerce_integer(value).ok_or_else(fail),
        ValueKind::Float => coerce_float(value)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(fail),
        ValueKind::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Ok(Value::String(other.to_string())),
        },
        ValueKind::List => match value {
            Value::Array(_) => Ok(value.clone()),
            _ => Err(fail()),
        },
        ValueKind::Any => Ok(value.clone()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Integers keep the full `i64`/`u64` range; floats truncate toward zero.
fn coerce_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n.clone())),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(f64::trunc)
            .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::from)
                .or_else(|_| s.parse::<u64>().map(Value::from))
                .ok()
        }
        Value::Bool(b) => Some(Value::from(i64::from(*b))),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Order two JSON numbers. Integers compare exactly; a float on either side
/// falls back to `f64`. `None` if either side is not a number.
fn compare_numbers(value: &Value, limit: &Value) -> Option<Ordering> {
    let (Value::Number(v), Value::Number(l)) = (value, limit) else {
        return None;
    };
    match (as_i128(v), as_i128(l)) {
        (Some(v), Some(l)) => Some(v.cmp(&l)),
        _ => v.as_f64()?.partial_cmp(&l.as_f64()?),
    }
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Validate an already-coerced value against the preference's constraints.
pub fn validate_value(value: &Value, pref: &Pref) -> std::result::Result<(), ValidationError> {
    if value.is_null() {
        if pref.is_required() {
            return Err(ValidationError::RequiredMissing {
                key: pref.key().to_string(),
            });
        }
        return Ok(());
    }

    for (bound, limit) in [(Bound::Lower, pref.ge()), (Bound::Upper, pref.le())] {
        let Some(limit) = limit else { continue };
        let Some(ordering) = compare_numbers(value, limit) else {
            continue;
        };
        let violated = match bound {
            Bound::Lower => ordering == Ordering::Less,
            Bound::Upper => ordering == Ordering::Greater,
        };
        if violated {
            return Err(ValidationError::OutOfRange {
                key: pref.key().to_string(),
                value: value.clone(),
                bound,
                limit: limit.clone(),
            });
        }
    }

    if let (Some(max_length), Value::String(s)) = (pref.max_length(), value) {
        if s.chars().count() > max_length {
            return Err(ValidationError::TooLong {
                key: pref.key().to_string(),
                max_length,
            });
        }
    }

    if let Some(choices) = pref.choices() {
        let invalid = |item: &Value| ValidationError::InvalidChoice {
            key: pref.key().to_string(),
            value: item.clone(),
            valid: choices.iter().map(|c| c.value.clone()).collect(),
        };
        match (pref.kind(), value) {
            (ValueKind::List, Value::Array(items)) => {
                if let Some(bad) = items.iter().find(|item| !pref.allows_choice(item)) {
                    return Err(invalid(bad));
                }
            }
            _ => {
                if !pref.allows_choice(value) {
                    return Err(invalid(value));
                }
            }
        }
    }

    Ok(())
}

/// Coerce then validate, returning the coerced value.
pub fn coerce_and_validate(value: &Value, pref: &Pref) -> Result<Value> {
    let coerced = coerce_value(value, pref)?;
    validate_value(&coerced, pref)?;
    Ok(coerced)
}
