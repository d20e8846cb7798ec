//! Acceleration array parser.
//!
//! Normalises one dataset cell into a sequence of `f64` samples. Parsing is
//! total: anything that cannot be understood becomes an empty vector, which
//! callers treat as "no usable signal for this cell".

use serde_json::Value;
use tracing::debug;

/// Parses an arbitrary cell value into samples.
///
/// Accepted shapes, in priority order:
/// 1. an array of numbers (numeric strings are accepted element-wise),
/// 2. a single number,
/// 3. text, decoded as JSON first and as comma-separated values second,
/// 4. null, which yields an empty vector.
pub fn parse_array(value: &Value) -> Vec<f64> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => from_json_items(items).unwrap_or_default(),
        Value::Number(n) => n.as_f64().map(|v| vec![v]).unwrap_or_default(),
        Value::String(text) => parse_text(text),
        other => {
            debug!(value = %other, "Unhandled cell type for array parsing");
            Vec::new()
        }
    }
}

/// Parses the textual encoding of an acceleration array.
///
/// JSON is tried first (`"[0.1, 0.2]"`, a bare `"0.5"` or a quoted `"\"0.5\""`). If that fails the
/// text is split on commas after removing one enclosing `[` / `]` pair;
/// tokens that are not numbers are skipped.
pub fn parse_text(text: &str) -> Vec<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
        let parsed = match &decoded {
            Value::Array(items) => from_json_items(items),
            Value::Number(n) => n.as_f64().map(|v| vec![v]),
            Value::String(inner) => inner.trim().parse::<f64>().ok().map(|v| vec![v]),
            _ => None,
        };
        if let Some(samples) = parsed {
            return samples;
        }
    }

    let samples = parse_delimited(trimmed);
    if samples.is_empty() {
        debug!(value = trimmed, "Failed to parse value");
    }
    samples
}

fn parse_delimited(text: &str) -> Vec<f64> {
    let inner = text.strip_prefix('[').unwrap_or(text);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    inner
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

/// Converts every element of a decoded JSON array, or `None` if any element
/// is not numeric.
fn from_json_items(items: &[Value]) -> Option<Vec<f64>> {
    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .collect()
}
