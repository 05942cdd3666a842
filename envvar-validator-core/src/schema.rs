//! Schema declarations.
//!
//! A [`Schema`] maps variable names to [`FieldSpec`]s in declaration order.
//! Schemas are built programmatically or loaded from JSON/YAML text:
//!
//! ```rust
//! use envvar_validator_core::schema::{FieldSpec, Schema};
//!
//! let schema = Schema::from_json_str(r#"{
//!     "PORT": {"type": "int", "default": 8000, "validators": ["port_range"]},
//!     "SECRET_KEY": {"type": "str", "required": true, "sensitive": true}
//! }"#)?;
//!
//! let built = Schema::new()
//!     .with_field("PORT", FieldSpec::integer().with_default(8000).with_validator("port_range"))
//!     .with_field("SECRET_KEY", FieldSpec::string().required().sensitive());
//!
//! assert_eq!(schema.names().collect::<Vec<_>>(), built.names().collect::<Vec<_>>());
//! # Ok::<(), envvar_validator_core::EnvValidatorError>(())
//! ```
//!
//! Custom validator instances only exist in programmatic schemas; loading
//! from text resolves validators by name.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::{EnvValidatorError, Result};
use crate::models::{EnvValue, FieldType};
use crate::validators::{CustomValidator, ValidatorRef};

/// Declaration of one environment variable.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "FieldSpecRepr", into = "FieldSpecRepr")]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub required: bool,
    /// Typed fallback when the variable is absent; never set on required fields
    pub default: Option<EnvValue>,
    /// Run in declaration order
    pub validators: Vec<ValidatorRef>,
    /// Masked in every report and export
    pub sensitive: bool,
    pub description: Option<String>,
    /// Allowed values for the `enum` validator
    pub enum_values: Option<Vec<String>>,
    /// Example values shown in generated templates
    pub examples: Vec<String>,
    /// Runs after every entry in `validators`
    pub custom_validator: Option<Arc<dyn CustomValidator>>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(FieldType::Integer)
    }

    pub fn list() -> Self {
        Self::new(FieldType::List)
    }

    /// Builder method to mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Builder method to set the default value.
    pub fn with_default(mut self, default: impl Into<EnvValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Builder method to append a validator, by name or instance.
    pub fn with_validator(mut self, validator: impl Into<ValidatorRef>) -> Self {
        self.validators.push(validator.into());
        self
    }

    /// Builder method to set the field's own custom validator.
    pub fn with_custom(mut self, validator: impl CustomValidator + 'static) -> Self {
        self.custom_validator = Some(Arc::new(validator));
        self
    }

    /// Builder method to mark the field as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to declare the values accepted by the `enum` validator.
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Checks the declaration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required field has a default, the
    /// default does not match the declared type, or a string default falls
    /// outside `enum_values`.
    pub fn check(&self, name: &str) -> Result<()> {
        let Some(default) = &self.default else {
            return Ok(());
        };

        if self.required {
            return Err(EnvValidatorError::configuration(format!(
                "variable '{name}' is required and cannot declare a default"
            )));
        }
        if default.field_type() != self.field_type {
            return Err(EnvValidatorError::configuration(format!(
                "default for variable '{name}' is {} but the field is declared {}",
                default.field_type(),
                self.field_type
            )));
        }
        if let (Some(allowed), Some(value)) = (&self.enum_values, default.as_str())
            && !allowed.iter().any(|candidate| candidate == value)
        {
            return Err(EnvValidatorError::configuration(format!(
                "default for variable '{name}' is not one of its enum_values"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default: &dyn fmt::Debug = match (&self.default, self.sensitive) {
            (Some(_), true) => &"***REDACTED***",
            (default, _) => default,
        };
        f.debug_struct("FieldSpec")
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("default", default)
            .field("validators", &self.validators)
            .field("sensitive", &self.sensitive)
            .field("description", &self.description)
            .field("enum_values", &self.enum_values)
            .field("examples", &self.examples)
            .field(
                "custom_validator",
                &self.custom_validator.as_ref().map(|custom| custom.name().to_string()),
            )
            .finish()
    }
}

/// Text form of a field spec.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpecRepr {
    #[serde(rename = "type", default)]
    field_type: FieldType,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    validators: Vec<String>,
    #[serde(default)]
    sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    examples: Vec<String>,
}

impl TryFrom<FieldSpecRepr> for FieldSpec {
    type Error = String;

    fn try_from(repr: FieldSpecRepr) -> std::result::Result<Self, Self::Error> {
        let default = repr
            .default
            .as_ref()
            .map(|value| EnvValue::from_json(value, repr.field_type))
            .transpose()
            .map_err(|e| format!("invalid default: {e}"))?;

        Ok(Self {
            field_type: repr.field_type,
            required: repr.required,
            default,
            validators: repr.validators.into_iter().map(ValidatorRef::Named).collect(),
            sensitive: repr.sensitive,
            description: repr.description,
            enum_values: repr.enum_values,
            examples: repr.examples,
            custom_validator: None,
        })
    }
}

impl From<FieldSpec> for FieldSpecRepr {
    fn from(spec: FieldSpec) -> Self {
        Self {
            field_type: spec.field_type,
            required: spec.required,
            default: spec.default.as_ref().map(env_value_to_json),
            // Instances have no text form
            validators: spec
                .validators
                .into_iter()
                .filter_map(|validator| match validator {
                    ValidatorRef::Named(name) => Some(name),
                    ValidatorRef::Custom(_) => None,
                })
                .collect(),
            sensitive: spec.sensitive,
            description: spec.description,
            enum_values: spec.enum_values,
            examples: spec.examples,
        }
    }
}

fn env_value_to_json(value: &EnvValue) -> serde_json::Value {
    match value {
        EnvValue::Bool(b) => serde_json::Value::Bool(*b),
        EnvValue::Integer(i) => serde_json::Value::from(*i),
        EnvValue::List(items) => serde_json::Value::from(items.clone()),
        EnvValue::String(s) => serde_json::Value::String(s.clone()),
    }
}

/// Ordered mapping from variable name to [`FieldSpec`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a field, replacing an existing declaration of
    /// the same name in place.
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Adds a field, replacing an existing declaration of the same name in
    /// place.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks every declaration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for names that cannot be environment
    /// variables and for any field that fails [`FieldSpec::check`].
    pub fn check(&self) -> Result<()> {
        for (name, spec) in &self.fields {
            if name.is_empty() || name.contains('=') || name.contains('\0') {
                return Err(EnvValidatorError::configuration(format!(
                    "'{}' is not a valid environment variable name",
                    name.escape_debug()
                )));
            }
            spec.check(name)?;
        }
        Ok(())
    }

    /// Parses and checks a JSON schema document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed documents and a
    /// configuration error for inconsistent declarations.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(text)
            .map_err(|e| EnvValidatorError::serialization("parsing JSON schema", e))?;
        schema.check()?;
        Ok(schema)
    }

    /// Parses and checks a YAML schema document.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_json_str`].
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let schema: Self = serde_yaml::from_str(text)
            .map_err(|e| EnvValidatorError::serialization("parsing YAML schema", e))?;
        schema.check()?;
        Ok(schema)
    }

    /// Pretty JSON form of the schema.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EnvValidatorError::serialization("encoding schema as JSON", e))
    }

    /// YAML form of the schema.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| EnvValidatorError::serialization("encoding schema as YAML", e))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldSpec)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldSpec)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (name, spec) in iter {
            schema.insert(name, spec);
        }
        schema
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, spec) in &self.fields {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of variable names to field specs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut schema = Schema::new();
                while let Some(name) = access.next_key::<String>()? {
                    if schema.contains(&name) {
                        return Err(serde::de::Error::custom(format!(
                            "variable '{name}' is declared more than once"
                        )));
                    }
                    let spec = access.next_value::<FieldSpec>().map_err(|e| {
                        <A::Error as serde::de::Error>::custom(format!("variable '{name}': {e}"))
                    })?;
                    schema.fields.push((name, spec));
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidatorMessage;

    #[test]
    fn test_json_schema_preserves_declared_order() {
        let schema = Schema::from_json_str(
            r#"{
                "ZETA": {"type": "str"},
                "ALPHA": {"type": "bool", "default": true},
                "MIDDLE": {"type": "list", "default": ["a", "b"]}
            }"#,
        )
        .unwrap();

        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["ZETA", "ALPHA", "MIDDLE"]);
        assert_eq!(schema.get("ALPHA").unwrap().default, Some(EnvValue::Bool(true)));
        assert_eq!(
            schema.get("MIDDLE").unwrap().default,
            Some(EnvValue::from(vec!["a", "b"]))
        );
    }

    #[test]
    fn test_type_aliases_and_string_defaults() {
        let schema = Schema::from_json_str(
            r#"{"PORT": {"type": "integer", "default": "8000", "validators": ["port_range"]}}"#,
        )
        .unwrap();
        let port = schema.get("PORT").unwrap();
        assert_eq!(port.field_type, FieldType::Integer);
        assert_eq!(port.default, Some(EnvValue::Integer(8000)));
        assert_eq!(port.validators[0].name(), "port_range");
    }

    #[test]
    fn test_yaml_schema() {
        let schema = Schema::from_yaml_str(concat!(
            "DEBUG:\n  type: bool\n  default: false\n",
            "ALLOWED_HOSTS:\n  type: list\n  default: [localhost]\n",
        ))
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("DEBUG").unwrap().default, Some(EnvValue::Bool(false)));
    }

    #[test]
    fn test_rejects_unknown_keys_and_duplicates() {
        assert!(Schema::from_json_str(r#"{"A": {"type": "str", "requried": true}}"#).is_err());
        assert!(Schema::from_json_str(r#"{"A": {"type": "str"}, "A": {"type": "int"}}"#).is_err());
        assert!(Schema::from_json_str(r#"{"A": {"type": "float"}}"#).is_err());
    }

    #[test]
    fn test_required_field_cannot_have_default() {
        let text = r#"{"A": {"type": "str", "required": true, "default": "x"}}"#;
        let err = Schema::from_json_str(text).unwrap_err();
        assert!(matches!(err, EnvValidatorError::Configuration { .. }));

        let schema =
            Schema::new().with_field("B", FieldSpec::string().required().with_default("x"));
        assert!(schema.check().is_err());
    }

    #[test]
    fn test_default_type_mismatch_is_rejected() {
        let schema = Schema::new().with_field("PORT", FieldSpec::integer().with_default("8000"));
        assert!(schema.check().is_err());
        let text = r#"{"PORT": {"type": "int", "default": "eighty"}}"#;
        assert!(Schema::from_json_str(text).is_err());
    }

    #[test]
    fn test_enum_default_must_be_allowed() {
        let schema = Schema::new().with_field(
            "MODE",
            FieldSpec::string()
                .with_enum_values(["fast", "safe"])
                .with_default("reckless"),
        );
        assert!(schema.check().is_err());
    }

    #[test]
    fn test_invalid_variable_names() {
        assert!(Schema::new().with_field("", FieldSpec::string()).check().is_err());
        assert!(Schema::new().with_field("A=B", FieldSpec::string()).check().is_err());
    }

    #[test]
    fn test_serialization_omits_custom_instances() {
        let schema = Schema::new().with_field(
            "TOKEN",
            FieldSpec::string()
                .with_validator("api_key")
                .with_validator(ValidatorRef::custom(|_: &str| {
                    Err::<(), _>(ValidatorMessage::new("never"))
                }))
                .sensitive(),
        );

        let json = schema.to_json_string().unwrap();
        let back = Schema::from_json_str(&json).unwrap();
        let token = back.get("TOKEN").unwrap();
        assert_eq!(token.validators.len(), 1);
        assert!(token.sensitive);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let schema = Schema::new()
            .with_field("A", FieldSpec::string())
            .with_field("B", FieldSpec::string())
            .with_field("A", FieldSpec::integer());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(schema.get("A").unwrap().field_type, FieldType::Integer);
    }

    #[test]
    fn test_debug_masks_sensitive_default() {
        let spec = FieldSpec::string().with_default("hunter2-hunter2").sensitive();
        let rendered = format!("{spec:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }
}
