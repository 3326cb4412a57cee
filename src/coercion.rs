//! Loose conversion of field values into fixed Rust types.
//!
//! The rules mirror how a dynamically typed client reads database fields:
//!
//! * integers truncate floats toward zero and read the leading numeric prefix
//!   of strings (`"42abc"` is `42`, `"abc"` is `0`)
//! * floats read the leading numeric literal of strings, `0.0` when there is none
//! * strings render numbers in their shortest decimal form, `true` as `"1"`,
//!   `false` and NULL as `""`
//! * booleans are false only for `0`, `0.0`, `""`, `"0"` and NULL

use crate::types::Value;

/// Coerce a value to an integer.
#[must_use]
pub fn to_int(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        // `as` truncates toward zero, saturates out-of-range values and maps NaN to 0
        Value::Float(f) => *f as i64,
        Value::Text(s) => str_to_int(s),
        Value::Bool(b) => i64::from(*b),
        Value::Blob(bytes) => str_to_int(&String::from_utf8_lossy(bytes)),
        Value::Null => 0,
    }
}

/// Coerce a value to a float.
#[must_use]
pub fn to_float(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Text(s) => str_to_float(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Blob(bytes) => str_to_float(&String::from_utf8_lossy(bytes)),
        Value::Null => 0.0,
    }
}

/// Coerce a value to its text representation.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => float_to_text(*f),
        Value::Text(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Coerce a value to a boolean.
#[must_use]
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(s) => !(s.is_empty() || s == "0"),
        Value::Bool(b) => *b,
        Value::Blob(bytes) => !(bytes.is_empty() || bytes.as_slice() == b"0"),
        Value::Null => false,
    }
}

fn float_to_text(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        let rendered = if f.is_sign_positive() { "INF" } else { "-INF" };
        rendered.to_string()
    } else {
        f.to_string()
    }
}

/// Parse the integer at the start of `s`.
fn str_to_int(s: &str) -> i64 {
    let Some(prefix) = numeric_prefix(s) else {
        return 0;
    };
    if prefix.contains(['.', 'e', 'E']) {
        return prefix.parse::<f64>().map_or(0, |f| f as i64);
    }
    match prefix.parse::<i64>() {
        Ok(i) => i,
        // too many digits for i64: saturate like the float path does
        Err(_) => prefix.parse::<f64>().map_or(0, |f| f as i64),
    }
}

fn str_to_float(s: &str) -> f64 {
    numeric_prefix(s)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Longest leading numeric literal of `s`, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, and an optional
/// exponent that is only taken when at least one digit follows it.
fn numeric_prefix(s: &str) -> Option<&str> {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    Some(&s[..end])
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
