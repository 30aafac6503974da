//! Output filters.
//!
//! Only the small set the storefront templates rely on is implemented.
//! Unknown filters are applied as identity with a debug log, matching the
//! engine's lenient posture toward author mistakes.

use serde_json::Value;

/// Applies a named filter to a value.
#[must_use]
pub fn apply(name: &str, value: Value) -> Value {
    match name {
        "script_safe" => Value::String(escape_script_string(&value_as_str(&value))),
        "json" => Value::String(serde_json::to_string(&value).unwrap_or_default()),
        "upcase" => Value::String(value_as_str(&value).to_uppercase()),
        "downcase" => Value::String(value_as_str(&value).to_lowercase()),
        other => {
            tracing::debug!("unknown filter '{other}', passing value through");
            value
        }
    }
}

/// Escapes a string for safe interpolation into a JavaScript string literal.
///
/// Covers backslash, both quote styles, newline, carriage return and tab.
#[must_use]
pub fn escape_script_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

fn value_as_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn script_safe_escapes_the_full_set() {
        let input = "a\\b'c\"d\ne\rf\tg";
        assert_eq!(
            escape_script_string(input),
            "a\\\\b\\'c\\\"d\\ne\\rf\\tg"
        );
    }

    #[test]
    fn json_filter_serializes() {
        assert_eq!(
            apply("json", json!({ "a": 1 })),
            Value::String("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn unknown_filter_is_identity() {
        assert_eq!(apply("sparkle", json!("x")), json!("x"));
    }

    #[test]
    fn case_filters() {
        assert_eq!(apply("upcase", json!("Shop")), json!("SHOP"));
        assert_eq!(apply("downcase", json!("Shop")), json!("shop"));
    }
}
