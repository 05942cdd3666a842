//! Core data models for validation results.
//!
//! These are value objects: one [`ValidationResult`] is produced per
//! `validate()` call and handed to the caller, and the engine keeps no
//! reference to it afterwards.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::security::SecurityScan;

/// Semantic type a field's raw string is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldType {
    /// Identity conversion
    #[default]
    #[serde(rename = "str", alias = "string")]
    String,
    /// `true/1/yes/on` and `false/0/no/off`, case-insensitive
    #[serde(rename = "bool", alias = "boolean")]
    Boolean,
    /// Base-10 signed 64-bit integer
    #[serde(rename = "int", alias = "integer")]
    Integer,
    /// Comma-separated list of strings
    #[serde(rename = "list")]
    List,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "str"),
            Self::Boolean => write!(f, "bool"),
            Self::Integer => write!(f, "int"),
            Self::List => write!(f, "list"),
        }
    }
}

/// A coerced environment value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Integer(i64),
    List(Vec<String>),
    String(String),
}

impl EnvValue {
    /// The field type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Boolean,
            Self::Integer(_) => FieldType::Integer,
            Self::List(_) => FieldType::List,
            Self::String(_) => FieldType::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The string forms validators are run against.
    ///
    /// Scalars produce one entry; lists produce one entry per element.
    pub fn check_inputs(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Converts a schema default into a value of `field_type`.
    ///
    /// Strings are accepted for every type and go through the regular
    /// coercion rules, so `"8000"` is a valid integer default.
    pub fn from_json(value: &serde_json::Value, field_type: FieldType) -> Result<Self, String> {
        use serde_json::Value;

        match (field_type, value) {
            (FieldType::Boolean, Value::Bool(b)) => Ok(Self::Bool(*b)),
            (FieldType::Integer, Value::Number(n)) => {
                n.as_i64().map(Self::Integer).ok_or_else(|| {
                    "integer default must be a whole number within i64 range".to_string()
                })
            }
            (FieldType::List, Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    _ => Err("list default elements must be scalars".to_string()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            (field_type, Value::String(raw)) => {
                crate::coercion::coerce(raw, field_type).map_err(|e| e.to_string())
            }
            (field_type, other) => Err(format!(
                "default of JSON type {} does not match field type {}",
                json_type_name(other),
                field_type
            )),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::List(items) => write!(f, "{}", items.join(",")),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for EnvValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnvValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for EnvValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for EnvValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Deployment stage the environment is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Development,
    Testing,
    Staging,
    Production,
    /// Neither configured nor declared by the environment
    #[default]
    Unspecified,
}

impl EnvironmentType {
    /// Parses a stage name, accepting the usual short aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Self::Development),
            "testing" | "test" => Some(Self::Testing),
            "staging" | "stage" => Some(Self::Staging),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnvironmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "unknown environment type '{s}' \
                 (expected development, testing, staging or production)"
            )
        })
    }
}

/// Classification of a validation error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required field absent, no default
    MissingRequired,
    /// Raw value cannot convert to the declared type
    TypeCoercion,
    /// A named or custom validator refused the value
    ValidatorRejection,
    /// A validator accepted the value with a concern
    ValidatorWarning,
    /// Variable present in the environment but not declared in the schema
    StrictModeViolation,
}

/// A single error or warning attached to a variable.
///
/// Messages describe the problem without echoing the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub variable_name: String,
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates an issue without a suggestion.
    pub fn new(
        variable_name: impl Into<String>,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            kind,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Builder method to attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches a suggestion when one is present.
    pub fn with_optional_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable_name, self.message)
    }
}

/// Coerced values keyed by variable name, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedValues {
    entries: Vec<(String, EnvValue)>,
}

impl ValidatedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value for the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: EnvValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EnvValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<EnvValue>> FromIterator<(K, V)> for ValidatedValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.insert(name, value.into());
        }
        values
    }
}

impl Serialize for ValidatedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValidatedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = ValidatedValues;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of variable names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut values = ValidatedValues::new();
                while let Some((name, value)) = access.next_entry::<String, EnvValue>()? {
                    values.insert(name, value);
                }
                Ok(values)
            }
        }

        deserializer.deserialize_map(ValuesVisitor)
    }
}

/// Timing and volume figures for one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Wall-clock duration of the pass in seconds
    pub validation_time: f64,
    /// Schema fields processed
    pub variables_validated: usize,
    pub errors_count: usize,
    pub warnings_count: usize,
}

/// Context describing how a pass was run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Variables visible in the environment source
    pub total_variables: usize,
    /// Fields declared in the schema
    pub schema_variables: usize,
    pub environment_type: EnvironmentType,
    pub strict_mode: bool,
    pub security_scanning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// Scorer output when security scanning ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_scan: Option<SecurityScan>,
    pub validated_at: DateTime<Utc>,
}

/// Outcome of one `validate()` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub is_valid: bool,
    pub validated_values: ValidatedValues,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// Advisory 0-100 rating, absent when security scanning is disabled
    pub security_score: Option<u8>,
    pub performance_metrics: PerformanceMetrics,
    pub metadata: ResultMetadata,
}

impl ValidationResult {
    /// Coerced value of a variable, if it resolved.
    pub fn get(&self, name: &str) -> Option<&EnvValue> {
        self.validated_values.get(name)
    }

    /// Errors attached to one variable.
    pub fn errors_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors.iter().filter(move |issue| issue.variable_name == name)
    }

    /// Warnings attached to one variable.
    pub fn warnings_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.warnings.iter().filter(move |issue| issue.variable_name == name)
    }
}
