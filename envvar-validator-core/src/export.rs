//! Redacted exports and reports.
//!
//! Every export path goes through [`redacted_values`]: sensitive fields are
//! replaced by [`REDACTED`] and passwords embedded in URL-shaped values are
//! masked, whatever the output format.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EnvValidatorError, Result, redact_database_url};
use crate::models::{
    EnvValue, EnvironmentType, PerformanceMetrics, ValidationIssue, ValidationResult,
};
use crate::schema::Schema;
use crate::security::SecurityIssue;

/// Placeholder written in place of sensitive values.
pub const REDACTED: &str = "***REDACTED***";

/// Masks the password of a URL-shaped value, leaving anything else as is.
fn mask_inline_password(value: &str) -> String {
    let has_password = value.contains("://")
        && url::Url::parse(value).is_ok_and(|parsed| parsed.password().is_some());
    if has_password {
        redact_database_url(value)
    } else {
        value.to_string()
    }
}

fn redact_value(value: &EnvValue) -> Value {
    match value {
        EnvValue::Bool(b) => Value::Bool(*b),
        EnvValue::Integer(i) => Value::from(*i),
        EnvValue::String(s) => Value::String(mask_inline_password(s)),
        EnvValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| Value::String(mask_inline_password(item)))
                .collect(),
        ),
    }
}

/// The validated values of `result` with sensitive data masked.
///
/// Variables the schema does not declare are treated as sensitive.
pub fn redacted_values(result: &ValidationResult, schema: &Schema) -> Map<String, Value> {
    result
        .validated_values
        .iter()
        .map(|(name, value)| {
            let sensitive = schema.get(name).is_none_or(|spec| spec.sensitive);
            let rendered = if sensitive {
                Value::String(REDACTED.to_string())
            } else {
                redact_value(value)
            };
            (name.to_string(), rendered)
        })
        .collect()
}

/// Headline figures of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub is_valid: bool,
    pub security_score: Option<u8>,
    pub total_variables: usize,
    pub schema_variables: usize,
    pub validated_variables: usize,
    pub errors_count: usize,
    pub warnings_count: usize,
}

/// How the validation pass was configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub environment_type: EnvironmentType,
    pub strict_mode: bool,
    pub security_scanning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// A complete, redacted validation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Time of the validation pass the report describes
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub performance: PerformanceMetrics,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub security_issues: Vec<SecurityIssue>,
    pub environment: EnvironmentInfo,
    pub values: Map<String, Value>,
}

impl ValidationReport {
    /// Builds the report for `result`, masking values per `schema`.
    pub fn from_result(result: &ValidationResult, schema: &Schema) -> Self {
        let metadata = &result.metadata;
        Self {
            generated_at: metadata.validated_at,
            summary: ReportSummary {
                is_valid: result.is_valid,
                security_score: result.security_score,
                total_variables: metadata.total_variables,
                schema_variables: metadata.schema_variables,
                validated_variables: result.validated_values.len(),
                errors_count: result.errors.len(),
                warnings_count: result.warnings.len(),
            },
            performance: result.performance_metrics.clone(),
            errors: result.errors.clone(),
            warnings: result.warnings.clone(),
            security_issues: metadata
                .security_scan
                .as_ref()
                .map(|scan| scan.issues.clone())
                .unwrap_or_default(),
            environment: EnvironmentInfo {
                environment_type: metadata.environment_type,
                strict_mode: metadata.strict_mode,
                security_scanning: metadata.security_scanning,
                framework: metadata.framework.clone(),
            },
            values: redacted_values(result, schema),
        }
    }
}

/// Renders export documents in one text format.
pub trait Exporter {
    /// Short format name such as `json`.
    fn format_name(&self) -> &'static str;

    /// Renders an arbitrary document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    fn render_value(&self, value: &Value) -> Result<String>;

    /// Renders the redacted value map of `result`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    fn export_values(&self, result: &ValidationResult, schema: &Schema) -> Result<String> {
        self.render_value(&Value::Object(redacted_values(result, schema)))
    }

    /// Renders a full report.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    fn export_report(&self, report: &ValidationReport) -> Result<String> {
        let value = serde_json::to_value(report)
            .map_err(|e| EnvValidatorError::serialization("building report document", e))?;
        self.render_value(&value)
    }
}

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn render_value(&self, value: &Value) -> Result<String> {
        serde_json::to_string_pretty(value)
            .map_err(|e| EnvValidatorError::serialization("encoding JSON export", e))
    }
}

/// YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlExporter;

impl Exporter for YamlExporter {
    fn format_name(&self) -> &'static str {
        "yaml"
    }

    fn render_value(&self, value: &Value) -> Result<String> {
        serde_yaml::to_string(value)
            .map_err(|e| EnvValidatorError::serialization("encoding YAML export", e))
    }
}

fn template_value(value: &EnvValue) -> String {
    match value {
        EnvValue::String(s) => mask_inline_password(s),
        other => other.to_string(),
    }
}

/// Renders a `.env.example` file documenting every field of `schema`.
///
/// Sensitive defaults are never written.
///
/// ```rust
/// use envvar_validator_core::export::render_env_template;
/// use envvar_validator_core::schema::{FieldSpec, Schema};
///
/// let schema = Schema::new()
///     .with_field("PORT", FieldSpec::integer().with_default(8000).with_description("Listen port"))
///     .with_field("SECRET_KEY", FieldSpec::string().required().sensitive());
/// let template = render_env_template(&schema);
///
/// assert!(template.contains("# Listen port\n"));
/// assert!(template.contains("PORT=8000\n"));
/// assert!(template.contains("SECRET_KEY=\n"));
/// ```
pub fn render_env_template(schema: &Schema) -> String {
    let mut out = String::from("# Environment variables\n");

    for (name, spec) in schema.iter() {
        out.push('\n');
        if let Some(description) = &spec.description {
            for line in description.lines() {
                out.push_str(&format!("# {line}\n"));
            }
        }

        let mut facts = vec![
            format!("Type: {}", spec.field_type),
            format!("Required: {}", if spec.required { "yes" } else { "no" }),
        ];
        let validators: Vec<&str> = spec.validators.iter().map(|v| v.name()).collect();
        if !validators.is_empty() {
            facts.push(format!("Validators: {}", validators.join(", ")));
        }
        if spec.sensitive {
            facts.push("Sensitive".to_string());
        }
        out.push_str(&format!("# {}\n", facts.join(" | ")));

        if let Some(allowed) = &spec.enum_values {
            out.push_str(&format!("# Allowed values: {}\n", allowed.join(", ")));
        }
        for example in spec.examples.iter().filter(|_| !spec.sensitive) {
            out.push_str(&format!("# Example: {}\n", mask_inline_password(example)));
        }

        let value = match (&spec.default, spec.sensitive) {
            (Some(default), false) => template_value(default),
            _ => String::new(),
        };
        out.push_str(&format!("{name}={value}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidatedValues;
    use crate::schema::FieldSpec;

    fn fixture() -> (ValidationResult, Schema) {
        let schema = Schema::new()
            .with_field("SECRET_KEY", FieldSpec::string().sensitive())
            .with_field("DATABASE_URL", FieldSpec::string())
            .with_field("PORT", FieldSpec::integer())
            .with_field("ALLOWED_HOSTS", FieldSpec::list());
        let values: ValidatedValues = [
            ("SECRET_KEY", EnvValue::from("s3cr3t-value-that-must-not-leak")),
            ("DATABASE_URL", EnvValue::from("postgresql://app:hunter2@db:5432/app")),
            ("PORT", EnvValue::Integer(8000)),
            ("ALLOWED_HOSTS", EnvValue::from(vec!["localhost", "example.com"])),
        ]
        .into_iter()
        .collect();
        let result = ValidationResult {
            is_valid: true,
            validated_values: values,
            ..ValidationResult::default()
        };
        (result, schema)
    }

    #[test]
    fn test_redacted_values() {
        let (result, schema) = fixture();
        let values = redacted_values(&result, &schema);

        assert_eq!(values["SECRET_KEY"], Value::String(REDACTED.to_string()));
        assert_eq!(
            values["DATABASE_URL"],
            Value::String("postgresql://app:****@db:5432/app".to_string())
        );
        assert_eq!(values["PORT"], Value::from(8000));
        assert_eq!(values["ALLOWED_HOSTS"], serde_json::json!(["localhost", "example.com"]));
    }

    #[test]
    fn test_undeclared_values_are_masked() {
        let (result, _) = fixture();
        let values = redacted_values(&result, &Schema::new());
        assert!(values.values().all(|v| v == REDACTED));
    }

    #[test]
    fn test_exports_never_contain_secrets() {
        let (result, schema) = fixture();
        let report = ValidationReport::from_result(&result, &schema);

        for exporter in [&JsonExporter as &dyn Exporter, &YamlExporter] {
            let values = exporter.export_values(&result, &schema).unwrap();
            let rendered_report = exporter.export_report(&report).unwrap();
            for output in [&values, &rendered_report] {
                assert!(!output.contains("s3cr3t-value"), "{}", exporter.format_name());
                assert!(!output.contains("hunter2"), "{}", exporter.format_name());
                assert!(output.contains(REDACTED));
            }
        }
    }

    #[test]
    fn test_export_is_deterministic() {
        let (result, schema) = fixture();
        let report = ValidationReport::from_result(&result, &schema);
        assert_eq!(
            JsonExporter.export_report(&report).unwrap(),
            JsonExporter
                .export_report(&ValidationReport::from_result(&result, &schema))
                .unwrap()
        );
    }

    #[test]
    fn test_report_summary() {
        let (result, schema) = fixture();
        let report = ValidationReport::from_result(&result, &schema);
        assert!(report.summary.is_valid);
        assert_eq!(report.summary.validated_variables, 4);
        assert_eq!(report.values.len(), 4);

        let rendered = JsonExporter.export_report(&report).unwrap();
        let json: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["summary"]["validated_variables"], 4);
        assert!(json["environment"].get("framework").is_none());
    }

    #[test]
    fn test_env_template() {
        let schema = Schema::new()
            .with_field(
                "MODE",
                FieldSpec::string()
                    .with_enum_values(["fast", "safe"])
                    .with_validator("enum")
                    .with_default("safe")
                    .with_example("fast"),
            )
            .with_field(
                "API_KEY",
                FieldSpec::string()
                    .sensitive()
                    .with_default("sk_live_do_not_print_me")
                    .with_example("sk_live_also_hidden"),
            )
            .with_field("HOSTS", FieldSpec::list().with_default(vec!["a", "b"]));

        let template = render_env_template(&schema);
        assert!(template.contains("# Type: str | Required: no | Validators: enum\n"));
        assert!(template.contains("# Allowed values: fast, safe\n"));
        assert!(template.contains("# Example: fast\n"));
        assert!(template.contains("MODE=safe\n"));
        assert!(template.contains("API_KEY=\n"));
        assert!(!template.contains("do_not_print_me"));
        assert!(!template.contains("also_hidden"));
        assert!(template.contains("HOSTS=a,b\n"));
    }
}
