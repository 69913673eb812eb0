//! Per-field coercion of request bodies.
//!
//! Payload structs keep each field as a raw `serde_json::Value` so that a value
//! of the wrong type is reported under its own key instead of rejecting the
//! whole body.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::FieldErrors;

pub const NOT_A_STRING: &str = "Not a valid string.";
pub const INVALID_INTEGER: &str = "A valid integer is required.";
pub const INVALID_NUMBER: &str = "A valid number is required.";
pub const INVALID_BOOLEAN: &str = "Must be a valid boolean.";

/// Strings pass through; numbers are accepted in their decimal form.
pub fn text(errors: &mut FieldErrors, field: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

/// Integers, integral floats (`50.0`) and numeric strings (`"50"`), bounded to `i32`.
pub fn integer(errors: &mut FieldErrors, field: &str, value: Value) -> Option<i32> {
    let parsed = match &value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => parse_integer(s),
        _ => None,
    };
    let Some(n) = parsed else {
        errors.add(field, INVALID_INTEGER);
        return None;
    };
    match i32::try_from(n) {
        Ok(n) => Some(n),
        Err(_) if n > 0 => {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
            None
        }
        Err(_) => {
            errors.add(
                field,
                format!("Ensure this value is greater than or equal to {}.", i32::MIN),
            );
            None
        }
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    // "15.0" and "15." count as integers
    let s = match s.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        _ => s,
    };
    s.parse().ok()
}

/// Numbers or numeric strings, including scientific notation.
pub fn decimal(errors: &mut FieldErrors, field: &str, value: Value) -> Option<Decimal> {
    let parsed = match &value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, INVALID_NUMBER);
    }
    parsed
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

pub fn boolean(errors: &mut FieldErrors, field: &str, value: Value) -> Option<bool> {
    let parsed = match &value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, INVALID_BOOLEAN);
    }
    parsed
}
