//! Absence handling at the ingestion boundary
//!
//! The portal encodes "no value" several ways: `null`, the literal string
//! `"-"`, empty strings and `NaN` (sometimes bare, which is not valid JSON).
//! Everything is folded into `Option::None` here so aggregation code only
//! ever sees one convention.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Bare tokens some producers emit in place of numbers
const BARE_TOKENS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

/// Returns true if a string value means "absent"
pub fn is_absent_text(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t == "-" || t.eq_ignore_ascii_case("nan")
}

/// Normalize a JSON value to present text
///
/// Numbers are rendered without a trailing `.0` so that ids which passed
/// through a float column still match their string form.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !is_absent_text(s) => Some(s.trim().to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    None
                } else if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a JSON value to a finite number
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !is_absent_text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Serde adapter: any sentinel becomes `None`, ids may be numbers or strings
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text))
}

/// Serde adapter for numeric fields (coordinates)
pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number))
}

/// Serde adapter for the year partition
pub fn opt_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number)
        .filter(|y| y.fract() == 0.0 && (1900.0..=2200.0).contains(y))
        .map(|y| y as i32))
}

/// Rewrite a non-standard payload into valid JSON
///
/// Bare `NaN`/`Infinity` tokens and the `"-"` string literal become `null`.
/// Other string literals pass through untouched, escapes included.
pub fn sanitize_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(ch) = rest.chars().next() {
        if ch == '"' {
            let (literal, tail) = rest.split_at(string_literal_len(rest));
            if literal == "\"-\"" {
                out.push_str("null");
            } else {
                out.push_str(literal);
            }
            rest = tail;
            continue;
        }

        if let Some(token) = BARE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Byte length of the string literal at the start of `s` (quotes included)
fn string_literal_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    // Unterminated: hand the rest to the parser so it reports the error
    s.len()
}
