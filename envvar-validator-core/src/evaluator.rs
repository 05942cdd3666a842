//! Per-field evaluation: default handling, coercion and validators.
//!
//! Evaluation never stops at the first problem. Every validator runs against
//! every coerced value so one pass reports all errors for a field.

use crate::coercion::coerce;
use crate::error::Result;
use crate::models::{EnvValue, IssueKind, ValidationIssue};
use crate::schema::FieldSpec;
use crate::validators::{ResolvedValidator, ValidatorRegistry, Verdict};

/// Result of evaluating one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOutcome {
    /// Absent when the field is missing or could not be coerced
    pub value: Option<EnvValue>,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A field with its validators resolved against a registry.
#[derive(Debug, Clone)]
pub struct CompiledField {
    name: String,
    spec: FieldSpec,
    validators: Vec<ResolvedValidator>,
}

impl CompiledField {
    /// Resolves every validator the field references.
    ///
    /// # Errors
    ///
    /// Fails on unknown validator names and on `enum` without values.
    pub fn compile(
        name: impl Into<String>,
        spec: &FieldSpec,
        registry: &ValidatorRegistry,
    ) -> Result<Self> {
        let name = name.into();
        let mut validators = spec
            .validators
            .iter()
            .map(|reference| registry.resolve(reference, spec, &name))
            .collect::<Result<Vec<_>>>()?;
        if let Some(custom) = &spec.custom_validator {
            validators.push(ResolvedValidator::Custom(custom.clone()));
        }

        Ok(Self {
            name,
            spec: spec.clone(),
            validators,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Evaluates the field against its raw value, if any.
    ///
    /// An empty string counts as present.
    pub fn evaluate(&self, raw: Option<&str>) -> FieldOutcome {
        let mut outcome = FieldOutcome::default();

        let value = match raw {
            Some(raw) => match coerce(raw, self.spec.field_type) {
                Ok(value) => value,
                Err(e) => {
                    outcome.errors.push(
                        ValidationIssue::new(
                            &self.name,
                            IssueKind::TypeCoercion,
                            format!("Invalid value for {}: {}", self.name, e),
                        )
                        .with_suggestion(e.suggestion()),
                    );
                    return outcome;
                }
            },
            None if self.spec.required => {
                outcome.errors.push(
                    ValidationIssue::new(
                        &self.name,
                        IssueKind::MissingRequired,
                        format!("Missing required variable {}", self.name),
                    )
                    .with_suggestion(format!("Set {} in the environment", self.name)),
                );
                return outcome;
            }
            // Defaults are already typed
            None => match &self.spec.default {
                Some(default) => default.clone(),
                None => return outcome,
            },
        };

        for input in value.check_inputs() {
            for validator in &self.validators {
                match validator.check(&input) {
                    Verdict::Accept => {}
                    Verdict::Warn(message) => outcome.warnings.push(
                        ValidationIssue::new(
                            &self.name,
                            IssueKind::ValidatorWarning,
                            format!("{} ({})", message.message, validator.name()),
                        )
                        .with_optional_suggestion(message.suggestion),
                    ),
                    Verdict::Reject(message) => outcome.errors.push(
                        ValidationIssue::new(
                            &self.name,
                            IssueKind::ValidatorRejection,
                            format!("{} ({})", message.message, validator.name()),
                        )
                        .with_optional_suggestion(message.suggestion),
                    ),
                }
            }
        }

        outcome.value = Some(value);
        outcome
    }
}

/// Evaluates one field with the built-in registry.
///
/// # Errors
///
/// Fails when the field references a validator the registry cannot resolve.
///
/// # Example
/// ```rust
/// use envvar_validator_core::evaluator::evaluate;
/// use envvar_validator_core::models::EnvValue;
/// use envvar_validator_core::schema::FieldSpec;
///
/// let spec = FieldSpec::integer().with_default(8000).with_validator("port_range");
/// let outcome = evaluate("PORT", &spec, None)?;
/// assert_eq!(outcome.value, Some(EnvValue::Integer(8000)));
/// assert!(outcome.errors.is_empty());
/// # Ok::<(), envvar_validator_core::EnvValidatorError>(())
/// ```
pub fn evaluate(name: &str, spec: &FieldSpec, raw: Option<&str>) -> Result<FieldOutcome> {
    let field = CompiledField::compile(name, spec, &ValidatorRegistry::new())?;
    Ok(field.evaluate(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidatorMessage;

    #[test]
    fn test_missing_required_field() {
        let outcome = evaluate("SECRET_KEY", &FieldSpec::string().required(), None).unwrap();
        assert_eq!(outcome.value, None);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, IssueKind::MissingRequired);
        assert_eq!(outcome.errors[0].variable_name, "SECRET_KEY");
    }

    #[test]
    fn test_missing_optional_without_default_is_absent() {
        let outcome = evaluate("OPTIONAL", &FieldSpec::string(), None).unwrap();
        assert_eq!(outcome, FieldOutcome::default());
    }

    #[test]
    fn test_empty_string_counts_as_present() {
        let outcome = evaluate("NAME", &FieldSpec::string().required(), Some("")).unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.value, Some(EnvValue::from("")));
    }

    #[test]
    fn test_coercion_failure_skips_validators() {
        let spec = FieldSpec::integer()
            .with_validator("port_range")
            .with_validator("positive_integer");
        let outcome = evaluate("PORT", &spec, Some("not_a_number")).unwrap();

        assert_eq!(outcome.value, None);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, IssueKind::TypeCoercion);
        assert!(!outcome.errors[0].message.contains("not_a_number"));
    }

    #[test]
    fn test_all_validator_errors_are_collected() {
        let spec = FieldSpec::string()
            .with_validator("email")
            .with_validator("url")
            .with_custom(|_: &str| Err::<(), _>(ValidatorMessage::new("always rejects")));
        let outcome = evaluate("CONTACT", &spec, Some("nonsense")).unwrap();

        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors.iter().all(|e| e.kind == IssueKind::ValidatorRejection));
        assert!(outcome.errors[0].message.contains("(email)"));
        assert!(outcome.errors[1].message.contains("(url)"));
        assert!(outcome.errors[2].message.contains("(custom)"));
        assert_eq!(outcome.value, Some(EnvValue::from("nonsense")));
    }

    #[test]
    fn test_warnings_keep_the_value() {
        let spec = FieldSpec::string().with_validator("url");
        let outcome = evaluate("API_URL", &spec, Some("http://api.example.com")).unwrap();

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, IssueKind::ValidatorWarning);
        assert_eq!(outcome.value, Some(EnvValue::from("http://api.example.com")));
    }

    #[test]
    fn test_list_elements_validated_individually() {
        let spec = FieldSpec::list().with_validator("email");
        let raw = "a@example.com, nope, b@example.com";
        let outcome = evaluate("ADMINS", &spec, Some(raw)).unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.value,
            Some(EnvValue::from(vec!["a@example.com", "nope", "b@example.com"]))
        );
    }

    #[test]
    fn test_default_is_validated() {
        let spec = FieldSpec::integer().with_default(0).with_validator("port_range");
        let outcome = evaluate("PORT", &spec, None).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.value, Some(EnvValue::Integer(0)));
    }

    #[test]
    fn test_unknown_validator_fails_at_compile() {
        let spec = FieldSpec::string().with_validator("ipv9");
        assert!(evaluate("HOST", &spec, Some("x")).is_err());
    }

    #[test]
    fn test_custom_validator_with_captured_state() {
        let expected = String::from("production-db");
        let spec = FieldSpec::string().with_custom(move |value: &str| {
            if value == expected {
                Ok(())
            } else {
                Err(ValidatorMessage::new("must point at the production database")
                    .with_suggestion("Use the production-db host"))
            }
        });

        assert!(evaluate("DB_HOST", &spec, Some("production-db")).unwrap().errors.is_empty());
        let outcome = evaluate("DB_HOST", &spec, Some("staging-db")).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors[0].suggestion.as_deref(),
            Some("Use the production-db host")
        );
    }
}
