//! Validator registry and built-in checks.
//!
//! A validator inspects one string and either accepts it, accepts it with a
//! warning, or rejects it with a human-readable message and optional
//! suggestion. Validators come in two flavours, kept as a closed union so the
//! registry can check a schema exhaustively when a validator is constructed:
//!
//! - **Built-in** checks resolved by name (`"email"`, `"port_range"`, ...)
//! - **Custom** instances supplied directly in the schema, which may carry
//!   their own state
//!
//! # Example
//! ```rust
//! use envvar_validator_core::validators::{ValidatorMessage, ValidatorRegistry, Verdict};
//!
//! let registry = ValidatorRegistry::new();
//! let port = registry.builtin("port_range").expect("built-in");
//! assert_eq!(port.check("8080"), Verdict::Accept);
//! assert!(matches!(port.check("0"), Verdict::Reject(_)));
//! ```

mod builtin;
mod cron;
mod registry;

use std::fmt;
use std::sync::Arc;

pub use builtin::BuiltinValidator;
pub use registry::{ValidatorDescriptor, ValidatorRegistry};

/// Message produced by a validator that warns about or rejects a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorMessage {
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidatorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    /// Builder method to attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidatorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidatorMessage {}

/// Outcome of checking one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Accepted, with a non-fatal concern
    Warn(ValidatorMessage),
    Reject(ValidatorMessage),
}

/// Caller-supplied validator with the single-value contract.
///
/// Any `Fn(&str) -> Result<(), ValidatorMessage>` closure implements this
/// trait, so state can be captured directly:
///
/// ```rust
/// use envvar_validator_core::validators::{CustomValidator, ValidatorMessage};
///
/// let expected = "v2".to_string();
/// let pinned = move |value: &str| {
///     if value == expected {
///         Ok(())
///     } else {
///         Err(ValidatorMessage::new(format!("must be pinned to {expected}")))
///     }
/// };
/// assert!(pinned.validate("v2").is_ok());
/// assert!(pinned.validate("v1").is_err());
/// ```
pub trait CustomValidator: Send + Sync {
    /// Name used in diagnostics and schema dumps.
    fn name(&self) -> &str {
        "custom"
    }

    /// Accepts or rejects the value.
    fn validate(&self, value: &str) -> Result<(), ValidatorMessage>;
}

impl<F> CustomValidator for F
where
    F: Fn(&str) -> Result<(), ValidatorMessage> + Send + Sync,
{
    fn validate(&self, value: &str) -> Result<(), ValidatorMessage> {
        self(value)
    }
}

/// A validator reference as written in a schema.
#[derive(Clone)]
pub enum ValidatorRef {
    /// Looked up in the registry when the validator is built
    Named(String),
    /// Invoked directly, bypassing name lookup
    Custom(Arc<dyn CustomValidator>),
}

impl ValidatorRef {
    /// Wraps a custom validator instance.
    pub fn custom(validator: impl CustomValidator + 'static) -> Self {
        Self::Custom(Arc::new(validator))
    }

    /// Display name of the referenced validator.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Custom(validator) => validator.name(),
        }
    }
}

impl fmt::Debug for ValidatorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(validator) => f.debug_tuple("Custom").field(&validator.name()).finish(),
        }
    }
}

impl From<&str> for ValidatorRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ValidatorRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// A validator after registry resolution, ready to run.
#[derive(Clone)]
pub enum ResolvedValidator {
    Builtin(BuiltinValidator),
    Custom(Arc<dyn CustomValidator>),
}

impl ResolvedValidator {
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(builtin) => builtin.name(),
            Self::Custom(custom) => custom.name(),
        }
    }

    /// Runs the check against one string.
    pub fn check(&self, value: &str) -> Verdict {
        match self {
            Self::Builtin(builtin) => builtin.check(value),
            Self::Custom(custom) => match custom.validate(value) {
                Ok(()) => Verdict::Accept,
                Err(message) => Verdict::Reject(message),
            },
        }
    }
}

impl fmt::Debug for ResolvedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Custom(custom) => f.debug_tuple("Custom").field(&custom.name()).finish(),
        }
    }
}
