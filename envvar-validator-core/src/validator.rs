//! The validation orchestrator.
//!
//! [`EnvironmentValidator`] runs every schema field through the evaluator,
//! optionally flags undeclared variables and scores the result. Construction
//! does all the fallible work (schema checks, validator resolution), so a
//! built validator cannot fail at `validate()` time.
//!
//! Two entry points cover the two calling styles:
//! - [`EnvironmentValidator::validate`] always returns a [`ValidationResult`]
//!   to inspect
//! - [`EnvironmentValidator::validate_or_raise`] returns a [`ValidationError`]
//!   carrying every error when the result is invalid
//!
//! # Example
//! ```rust
//! use envvar_validator_core::env::MapEnv;
//! use envvar_validator_core::models::EnvValue;
//! use envvar_validator_core::schema::{FieldSpec, Schema};
//! use envvar_validator_core::validator::EnvironmentValidator;
//!
//! let schema = Schema::new()
//!     .with_field("PORT", FieldSpec::integer().with_default(8000).with_validator("port_range"))
//!     .with_field("DEBUG", FieldSpec::boolean().with_default(false));
//!
//! let validator = EnvironmentValidator::new(schema)?
//!     .with_source(MapEnv::new().with("PORT", "8080"));
//! let result = validator.validate();
//!
//! assert!(result.is_valid);
//! assert_eq!(result.get("PORT"), Some(&EnvValue::Integer(8080)));
//! assert_eq!(result.get("DEBUG"), Some(&EnvValue::Bool(false)));
//! # Ok::<(), envvar_validator_core::EnvValidatorError>(())
//! ```

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::env::{EnvSource, ProcessEnv};
use crate::error::{EnvValidatorError, Result, ValidationError};
use crate::evaluator::CompiledField;
use crate::models::{
    EnvironmentType, IssueKind, PerformanceMetrics, ResultMetadata, ValidatedValues,
    ValidationIssue, ValidationResult,
};
use crate::schema::Schema;
use crate::security::{ScoringPolicy, SecurityScorer};
use crate::validators::ValidatorRegistry;

/// Variables consulted, in order, when no environment type is configured.
pub const ENVIRONMENT_TYPE_VARIABLES: &[&str] = &["ENVIRONMENT", "APP_ENV"];

/// Variables strict mode ignores by default. A trailing `*` matches a prefix.
pub const DEFAULT_STRICT_IGNORE: &[&str] = &[
    "PATH", "HOME", "USER", "SHELL", "PWD", "OLDPWD", "LANG", "LC_*", "TERM", "TMPDIR", "HOSTNAME",
    "LOGNAME", "SHLVL", "_", "ENVIRONMENT", "APP_ENV",
];

/// Options for an [`EnvironmentValidator`].
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Overrides detection from the environment when set
    pub environment_type: Option<EnvironmentType>,
    /// Warn about variables the schema does not declare
    pub strict_mode: bool,
    /// Compute the advisory security score
    pub security_scanning: bool,
    pub scoring_policy: ScoringPolicy,
    pub registry: ValidatorRegistry,
    /// Names strict mode never reports
    pub strict_ignore: Vec<String>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            environment_type: None,
            strict_mode: false,
            security_scanning: true,
            scoring_policy: ScoringPolicy::default(),
            registry: ValidatorRegistry::default(),
            strict_ignore: DEFAULT_STRICT_IGNORE.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to pin the environment type.
    pub fn with_environment_type(mut self, environment_type: EnvironmentType) -> Self {
        self.environment_type = Some(environment_type);
        self
    }

    /// Builder method to enable/disable strict mode.
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Builder method to enable/disable security scoring.
    pub fn with_security_scanning(mut self, security_scanning: bool) -> Self {
        self.security_scanning = security_scanning;
        self
    }

    pub fn with_scoring_policy(mut self, policy: ScoringPolicy) -> Self {
        self.scoring_policy = policy;
        self
    }

    /// Builder method to resolve validator names through `registry`.
    pub fn with_registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Builder method to replace the strict-mode ignore list.
    pub fn with_strict_ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strict_ignore = names.into_iter().map(Into::into).collect();
        self
    }

    fn strict_ignores(&self, name: &str) -> bool {
        self.strict_ignore.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => pattern == name,
        })
    }
}

/// Validates an environment against a schema.
///
/// Immutable after construction; concurrent `validate()` calls are safe and
/// each produces an independent result.
pub struct EnvironmentValidator {
    schema: Schema,
    fields: Vec<CompiledField>,
    options: ValidatorOptions,
    scorer: SecurityScorer,
    source: Arc<dyn EnvSource>,
    framework: Option<String>,
}

impl EnvironmentValidator {
    /// Builds a validator with default options reading the process
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`Self::with_options`].
    pub fn new(schema: Schema) -> Result<Self> {
        Self::with_options(schema, ValidatorOptions::default())
    }

    /// Builds a validator reading the process environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for inconsistent field specs or an
    /// invalid scoring policy, and [`EnvValidatorError::UnknownValidator`]
    /// when a field names a validator the registry does not know.
    pub fn with_options(schema: Schema, options: ValidatorOptions) -> Result<Self> {
        schema.check()?;
        options.scoring_policy.validate().map_err(|e| {
            EnvValidatorError::configuration(format!("Invalid scoring policy: {e}"))
        })?;

        let fields = schema
            .iter()
            .map(|(name, spec)| CompiledField::compile(name, spec, &options.registry))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Built environment validator for {} variable(s) (strict_mode={}, security_scanning={})",
            fields.len(),
            options.strict_mode,
            options.security_scanning
        );

        Ok(Self {
            scorer: SecurityScorer::new(options.scoring_policy.clone()),
            schema,
            fields,
            options,
            source: Arc::new(ProcessEnv),
            framework: None,
        })
    }

    /// Builder method to read variables from `source` instead of the process
    /// environment.
    pub fn with_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    /// Builder method to share an existing source.
    pub fn with_shared_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// The configured environment source.
    pub fn source(&self) -> &dyn EnvSource {
        self.source.as_ref()
    }

    /// Name of the framework preset this validator was built from, if any.
    pub fn framework(&self) -> Option<&str> {
        self.framework.as_deref()
    }

    /// Validates the configured source.
    pub fn validate(&self) -> ValidationResult {
        self.validate_source(self.source.as_ref())
    }

    /// Validates the configured source, failing when any error was found.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] wrapping every error and the full result.
    pub fn validate_or_raise(&self) -> std::result::Result<ValidationResult, ValidationError> {
        let result = self.validate();
        if result.is_valid {
            Ok(result)
        } else {
            Err(ValidationError::new(result))
        }
    }

    /// Validates an explicit source.
    pub fn validate_source(&self, source: &dyn EnvSource) -> ValidationResult {
        let started = Instant::now();
        let span = tracing::debug_span!(
            "validate",
            variables = self.fields.len(),
            strict_mode = self.options.strict_mode
        );
        let _enter = span.enter();

        let environment_type = self.resolve_environment_type(source);
        let mut validated_values = ValidatedValues::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut rejected = Vec::new();

        for field in &self.fields {
            let raw = source.get(field.name());
            let outcome = field.evaluate(raw.as_deref());
            tracing::trace!(
                variable = field.name(),
                present = raw.is_some(),
                errors = outcome.errors.len(),
                warnings = outcome.warnings.len(),
                "Evaluated variable"
            );

            // Only values that passed every validator are exposed
            if outcome.errors.is_empty()
                && let Some(value) = outcome.value
            {
                validated_values.insert(field.name(), value);
            }
            if raw.is_some() && !outcome.errors.is_empty() {
                rejected.push(field.name());
            }
            errors.extend(outcome.errors);
            warnings.extend(outcome.warnings);
        }

        let names = source.names();
        if self.options.strict_mode {
            for name in names
                .iter()
                .filter(|name| !self.schema.contains(name) && !self.options.strict_ignores(name))
            {
                warnings.push(
                    ValidationIssue::new(
                        name,
                        IssueKind::StrictModeViolation,
                        format!("Variable {name} is not declared in the schema"),
                    )
                    .with_suggestion("Declare it in the schema or remove it from the environment"),
                );
            }
        }

        let security_scan = self.options.security_scanning.then(|| {
            self.scorer
                .score_or_neutral(&validated_values, &rejected, &self.schema, environment_type)
        });

        let result = ValidationResult {
            is_valid: errors.is_empty(),
            performance_metrics: PerformanceMetrics {
                validation_time: started.elapsed().as_secs_f64(),
                variables_validated: self.fields.len(),
                errors_count: errors.len(),
                warnings_count: warnings.len(),
            },
            validated_values,
            errors,
            warnings,
            security_score: security_scan.as_ref().map(|scan| scan.score),
            metadata: ResultMetadata {
                total_variables: names.len(),
                schema_variables: self.schema.len(),
                environment_type,
                strict_mode: self.options.strict_mode,
                security_scanning: self.options.security_scanning,
                framework: self.framework.clone(),
                security_scan,
                validated_at: Utc::now(),
            },
        };

        tracing::debug!(
            "Validation finished: valid={}, {} error(s), {} warning(s) in {:.6}s",
            result.is_valid,
            result.performance_metrics.errors_count,
            result.performance_metrics.warnings_count,
            result.performance_metrics.validation_time
        );
        result
    }

    /// Configured environment type, else the first of
    /// [`ENVIRONMENT_TYPE_VARIABLES`] set in `source`.
    pub fn resolve_environment_type(&self, source: &dyn EnvSource) -> EnvironmentType {
        if let Some(configured) = self.options.environment_type {
            return configured;
        }

        let Some((variable, raw)) = ENVIRONMENT_TYPE_VARIABLES
            .iter()
            .find_map(|variable| source.get(variable).map(|raw| (*variable, raw)))
        else {
            return EnvironmentType::Unspecified;
        };

        EnvironmentType::parse(&raw).unwrap_or_else(|| {
            tracing::debug!("{} does not name a known environment type", variable);
            EnvironmentType::Unspecified
        })
    }
}

impl fmt::Debug for EnvironmentValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentValidator")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .field("framework", &self.framework)
            .finish_non_exhaustive()
    }
}
