//! Type coercion from raw environment strings.
//!
//! Coercion is a pure function of the raw string and the declared type.
//! Errors never include the raw value since it may belong to a sensitive
//! field.

use thiserror::Error;

use crate::models::{EnvValue, FieldType};

/// Accepted spellings of `true`, compared case-insensitively.
pub const TRUTHY_VALUES: &[&str] = &["true", "1", "yes", "on"];

/// Accepted spellings of `false`, compared case-insensitively.
pub const FALSY_VALUES: &[&str] = &["false", "0", "no", "off"];

/// Raw value could not be converted to the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert value to {expected}: {reason}")]
pub struct CoercionError {
    pub expected: FieldType,
    pub reason: String,
}

impl CoercionError {
    fn new(expected: FieldType, reason: impl Into<String>) -> Self {
        Self {
            expected,
            reason: reason.into(),
        }
    }

    /// A hint on what a valid raw value looks like.
    pub fn suggestion(&self) -> String {
        match self.expected {
            FieldType::Boolean => format!(
                "Use one of: {} (true) or {} (false)",
                TRUTHY_VALUES.join(", "),
                FALSY_VALUES.join(", ")
            ),
            FieldType::Integer => format!(
                "Use a base-10 integer between {} and {}",
                i64::MIN,
                i64::MAX
            ),
            FieldType::String | FieldType::List => "Check the value format".to_string(),
        }
    }
}

/// Converts a raw environment string into `target`.
///
/// - `str` is the identity.
/// - `bool` matches [`TRUTHY_VALUES`] / [`FALSY_VALUES`] ignoring case and
///   surrounding whitespace.
/// - `int` parses a base-10 `i64`, surrounding whitespace ignored.
/// - `list` splits on commas, trims each element and drops empty trailing
///   elements; order of appearance is kept.
///
/// # Example
/// ```rust
/// use envvar_validator_core::coercion::coerce;
/// use envvar_validator_core::models::{EnvValue, FieldType};
///
/// let hosts = coerce("localhost,127.0.0.1, example.com", FieldType::List)?;
/// assert_eq!(hosts, EnvValue::from(vec!["localhost", "127.0.0.1", "example.com"]));
/// # Ok::<(), envvar_validator_core::coercion::CoercionError>(())
/// ```
pub fn coerce(raw: &str, target: FieldType) -> Result<EnvValue, CoercionError> {
    match target {
        FieldType::String => Ok(EnvValue::String(raw.to_string())),
        FieldType::Boolean => coerce_bool(raw).map(EnvValue::Bool),
        FieldType::Integer => coerce_integer(raw).map(EnvValue::Integer),
        FieldType::List => Ok(EnvValue::List(split_list(raw))),
    }
}

fn coerce_bool(raw: &str) -> Result<bool, CoercionError> {
    let normalized = raw.trim().to_ascii_lowercase();
    if TRUTHY_VALUES.contains(&normalized.as_str()) {
        Ok(true)
    } else if FALSY_VALUES.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::new(
            FieldType::Boolean,
            "not a recognized boolean literal",
        ))
    }
}

fn coerce_integer(raw: &str) -> Result<i64, CoercionError> {
    use std::num::IntErrorKind;

    raw.trim().parse::<i64>().map_err(|e| {
        let reason = match e.kind() {
            IntErrorKind::Empty => "value is empty",
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                "value is outside the 64-bit integer range"
            }
            _ => "value is not a base-10 integer",
        };
        CoercionError::new(FieldType::Integer, reason)
    })
}

fn split_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = raw.split(',').map(|item| item.trim().to_string()).collect();
    while items.last().is_some_and(String::is_empty) {
        items.pop();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_identity() {
        assert_eq!(
            coerce("  spaced  ", FieldType::String),
            Ok(EnvValue::String("  spaced  ".to_string()))
        );
    }

    #[test]
    fn test_boolean_literals() {
        for raw in ["true", "TRUE", "1", "Yes", "on", " on "] {
            assert_eq!(coerce(raw, FieldType::Boolean), Ok(EnvValue::Bool(true)), "{raw}");
        }
        for raw in ["false", "False", "0", "NO", "off"] {
            assert_eq!(coerce(raw, FieldType::Boolean), Ok(EnvValue::Bool(false)), "{raw}");
        }
    }

    #[test]
    fn test_boolean_rejects_other_values() {
        for raw in ["", "y", "enabled", "2", "truthy"] {
            let err = coerce(raw, FieldType::Boolean).unwrap_err();
            assert_eq!(err.expected, FieldType::Boolean);
        }
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(coerce("8080", FieldType::Integer), Ok(EnvValue::Integer(8080)));
        assert_eq!(coerce("-5", FieldType::Integer), Ok(EnvValue::Integer(-5)));
        assert_eq!(coerce(" 42\n", FieldType::Integer), Ok(EnvValue::Integer(42)));
    }

    #[test]
    fn test_integer_failures_do_not_echo_value() {
        let err = coerce("not_a_number", FieldType::Integer).unwrap_err();
        assert!(!err.to_string().contains("not_a_number"));
        assert!(err.reason.contains("base-10"));

        let err = coerce("99999999999999999999", FieldType::Integer).unwrap_err();
        assert!(err.reason.contains("range"));

        let err = coerce("", FieldType::Integer).unwrap_err();
        assert!(err.reason.contains("empty"));
    }

    #[test]
    fn test_list_trims_and_keeps_order() {
        assert_eq!(
            coerce("localhost,127.0.0.1, example.com", FieldType::List),
            Ok(EnvValue::from(vec!["localhost", "127.0.0.1", "example.com"]))
        );
        assert_eq!(
            coerce("b, a ,c", FieldType::List),
            Ok(EnvValue::from(vec!["b", "a", "c"]))
        );
    }

    #[test]
    fn test_list_drops_trailing_empty_elements() {
        assert_eq!(coerce("a,b,,", FieldType::List), Ok(EnvValue::from(vec!["a", "b"])));
        assert_eq!(coerce("", FieldType::List), Ok(EnvValue::List(Vec::new())));
        assert_eq!(
            coerce("a,,b", FieldType::List),
            Ok(EnvValue::from(vec!["a", "", "b"]))
        );
    }

    #[test]
    fn test_suggestions() {
        let err = coerce("maybe", FieldType::Boolean).unwrap_err();
        assert!(err.suggestion().contains("yes"));
    }
}
