#![forbid(unsafe_code)]

//! Built-in value validators.
//!
//! A validator is a pure predicate over a JSON value. `null` is never accepted
//! by the typed validators: a property that may be unset should go without a
//! validator.

use serde_json::Value;

/// Accepts `true` and `false`.
#[must_use]
pub fn is_boolean(value: &Value) -> bool {
    value.is_boolean()
}

/// Accepts any JSON number.
#[must_use]
pub fn is_number(value: &Value) -> bool {
    value.is_number()
}

/// Accepts any JSON string.
#[must_use]
pub fn is_string(value: &Value) -> bool {
    value.is_string()
}

/// Accepts numbers `>= 0`.
#[must_use]
pub fn is_non_negative_number(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean() {
        assert!(is_boolean(&json!(true)));
        assert!(is_boolean(&json!(false)));
        assert!(!is_boolean(&json!("true")));
        assert!(!is_boolean(&json!(0)));
        assert!(!is_boolean(&Value::Null));
    }

    #[test]
    fn numbers() {
        assert!(is_number(&json!(-1.5)));
        assert!(!is_number(&json!("3")));
        assert!(is_non_negative_number(&json!(0)));
        assert!(is_non_negative_number(&json!(12.25)));
        assert!(!is_non_negative_number(&json!(-0.1)));
        assert!(!is_non_negative_number(&Value::Null));
    }

    #[test]
    fn strings() {
        assert!(is_string(&json!("")));
        assert!(!is_string(&json!(["a"])));
    }
}
