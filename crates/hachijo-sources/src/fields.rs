//! Duck-typed field lookup over JSON objects.
//!
//! Upstream APIs expose the same logical attribute under several possible
//! key names. Each logical attribute is an explicit ordered candidate list,
//! resolved by first match, so new source variants are additive data
//! changes rather than new branching.

use serde_json::Value;

/// First candidate key holding a non-empty string.
pub(crate) fn pick_str(item: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = item.get(key).and_then(Value::as_str) {
            if !value.trim().is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

/// First candidate key holding a finite number.
pub(crate) fn pick_num(item: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(value) = item.get(key).and_then(Value::as_f64) {
            if value.is_finite() {
                return Some(value);
            }
        }
    }
    None
}
