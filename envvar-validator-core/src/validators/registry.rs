//! Name-to-validator resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{BuiltinValidator, CustomValidator, ResolvedValidator, ValidatorRef};
use crate::error::{EnvValidatorError, Result};
use crate::schema::FieldSpec;

/// Name and one-line description of a registered validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorDescriptor {
    pub name: String,
    pub description: String,
}

/// Resolves validator names used in schemas.
///
/// Built-ins are always present. Additional named validators can be
/// registered so schemas loaded from files can refer to them.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    custom: BTreeMap<String, Arc<dyn CustomValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named validator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is empty, shadows a
    /// built-in or is already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        validator: Arc<dyn CustomValidator>,
    ) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EnvValidatorError::configuration(
                "validator name must not be empty",
            ));
        }
        if name == "enum" || BuiltinValidator::from_name(&name).is_some() {
            return Err(EnvValidatorError::configuration(format!(
                "validator '{name}' is built in and cannot be replaced"
            )));
        }
        if self.custom.contains_key(&name) {
            return Err(EnvValidatorError::configuration(format!(
                "validator '{name}' is already registered"
            )));
        }

        tracing::debug!("Registered validator '{}'", name);
        self.custom.insert(name, validator);
        Ok(())
    }

    /// Builder variant of [`Self::register`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub fn with_validator(
        mut self,
        name: impl Into<String>,
        validator: impl CustomValidator + 'static,
    ) -> Result<Self> {
        self.register(name, Arc::new(validator))?;
        Ok(self)
    }

    /// True if `name` resolves without field context.
    pub fn contains(&self, name: &str) -> bool {
        name == "enum"
            || BuiltinValidator::from_name(name).is_some()
            || self.custom.contains_key(name)
    }

    /// Looks up a stateless built-in or registered validator by name.
    ///
    /// `enum` needs the field's allowed values and is only available through
    /// [`Self::resolve`].
    pub fn builtin(&self, name: &str) -> Option<ResolvedValidator> {
        BuiltinValidator::from_name(name)
            .map(ResolvedValidator::Builtin)
            .or_else(|| self.custom.get(name).cloned().map(ResolvedValidator::Custom))
    }

    /// Resolves one schema reference for `variable`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvValidatorError::UnknownValidator`] for names the registry
    /// does not know, and a configuration error when `enum` is used on a field
    /// without `enum_values`.
    pub fn resolve(
        &self,
        reference: &ValidatorRef,
        spec: &FieldSpec,
        variable: &str,
    ) -> Result<ResolvedValidator> {
        let name = match reference {
            ValidatorRef::Custom(custom) => {
                return Ok(ResolvedValidator::Custom(Arc::clone(custom)));
            }
            ValidatorRef::Named(name) => name.as_str(),
        };

        if name == "enum" {
            return match &spec.enum_values {
                Some(values) if !values.is_empty() => {
                    Ok(ResolvedValidator::Builtin(BuiltinValidator::Enum(values.clone())))
                }
                _ => Err(EnvValidatorError::configuration(format!(
                    "variable '{variable}' uses the enum validator without enum_values"
                ))),
            };
        }

        self.builtin(name)
            .ok_or_else(|| EnvValidatorError::unknown_validator(name, variable))
    }

    /// Every resolvable name with its description, built-ins first.
    pub fn descriptors(&self) -> Vec<ValidatorDescriptor> {
        let mut descriptors: Vec<ValidatorDescriptor> = BuiltinValidator::STATELESS
            .iter()
            .map(|builtin| ValidatorDescriptor {
                name: builtin.name().to_string(),
                description: builtin.description().to_string(),
            })
            .collect();

        let enum_validator = BuiltinValidator::Enum(Vec::new());
        descriptors.push(ValidatorDescriptor {
            name: enum_validator.name().to_string(),
            description: enum_validator.description().to_string(),
        });

        descriptors.extend(self.custom.iter().map(|(name, validator)| ValidatorDescriptor {
            name: name.clone(),
            description: format!("Registered validator ({})", validator.name()),
        }));
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{ValidatorMessage, Verdict};

    fn even_length(value: &str) -> std::result::Result<(), ValidatorMessage> {
        if value.len() % 2 == 0 {
            Ok(())
        } else {
            Err(ValidatorMessage::new("length must be even"))
        }
    }

    #[test]
    fn test_resolve_builtin_by_name() {
        let registry = ValidatorRegistry::new();
        let resolved = registry
            .resolve(&ValidatorRef::from("port_range"), &FieldSpec::integer(), "PORT")
            .unwrap();
        assert_eq!(resolved.name(), "port_range");
        assert_eq!(resolved.check("65535"), Verdict::Accept);
    }

    #[test]
    fn test_unknown_name_fails_loudly() {
        let registry = ValidatorRegistry::new();
        let err = registry
            .resolve(&ValidatorRef::from("ipv9"), &FieldSpec::string(), "HOST")
            .unwrap_err();
        assert!(matches!(
            err,
            EnvValidatorError::UnknownValidator { ref name, ref variable }
                if name == "ipv9" && variable == "HOST"
        ));
    }

    #[test]
    fn test_enum_requires_values() {
        let registry = ValidatorRegistry::new();
        let err = registry
            .resolve(&ValidatorRef::from("enum"), &FieldSpec::string(), "MODE")
            .unwrap_err();
        assert!(matches!(err, EnvValidatorError::Configuration { .. }));

        let spec = FieldSpec::string().with_enum_values(["a", "b"]);
        let resolved = registry
            .resolve(&ValidatorRef::from("enum"), &spec, "MODE")
            .unwrap();
        assert_eq!(resolved.check("b"), Verdict::Accept);
        assert!(matches!(resolved.check("c"), Verdict::Reject(_)));
    }

    #[test]
    fn test_custom_reference_bypasses_lookup() {
        let registry = ValidatorRegistry::new();
        let reference = ValidatorRef::custom(even_length);
        let resolved = registry
            .resolve(&reference, &FieldSpec::string(), "TOKEN")
            .unwrap();
        assert_eq!(resolved.check("ab"), Verdict::Accept);
        assert!(matches!(resolved.check("abc"), Verdict::Reject(_)));
    }

    #[test]
    fn test_register_named_validator() {
        let registry = ValidatorRegistry::new()
            .with_validator("even_length", even_length)
            .unwrap();
        assert!(registry.contains("even_length"));
        let resolved = registry
            .resolve(&ValidatorRef::from("even_length"), &FieldSpec::string(), "X")
            .unwrap();
        assert_eq!(resolved.check("abcd"), Verdict::Accept);
    }

    #[test]
    fn test_register_rejects_builtin_and_duplicate_names() {
        let mut registry = ValidatorRegistry::new();
        assert!(registry.register("email", Arc::new(even_length)).is_err());
        assert!(registry.register("enum", Arc::new(even_length)).is_err());
        assert!(registry.register("", Arc::new(even_length)).is_err());
        registry.register("even", Arc::new(even_length)).unwrap();
        assert!(registry.register("even", Arc::new(even_length)).is_err());
    }

    #[test]
    fn test_descriptors_cover_every_builtin() {
        let descriptors = ValidatorRegistry::new().descriptors();
        let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
        for expected in [
            "api_key",
            "aws_access_key",
            "aws_region",
            "aws_secret_key",
            "cron_expression",
            "database_url",
            "email",
            "enum",
            "port_range",
            "positive_integer",
            "secret_key",
            "stripe_publishable_key",
            "stripe_secret_key",
            "url",
        ] {
            assert!(names.contains(&expected), "{expected}");
        }
        assert_eq!(names.len(), 14);
        assert!(descriptors.iter().all(|d| !d.description.is_empty()));
    }
}
