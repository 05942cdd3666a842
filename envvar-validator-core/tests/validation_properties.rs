//! Property tests for the validation pipeline.
//!
//! Covers determinism, masking of sensitive values in every export format,
//! `port_range` boundaries and default handling with an empty environment.

use envvar_validator_core::validators::{ValidatorRegistry, Verdict};
use envvar_validator_core::{
    EnvValue, EnvironmentValidator, Exporter, FieldSpec, IssueKind, JsonExporter, MapEnv, Schema,
    ValidationReport, YamlExporter,
};
use proptest::prelude::*;

fn validator(schema: Schema, env: MapEnv) -> EnvironmentValidator {
    EnvironmentValidator::new(schema).unwrap().with_source(env)
}

fn port_check(value: &str) -> Verdict {
    ValidatorRegistry::new()
        .builtin("port_range")
        .unwrap()
        .check(value)
}

#[test]
fn test_port_range_boundaries() {
    assert_eq!(port_check("1"), Verdict::Accept);
    assert_eq!(port_check("65535"), Verdict::Accept);
    assert!(matches!(port_check("0"), Verdict::Reject(_)));
    assert!(matches!(port_check("65536"), Verdict::Reject(_)));
    assert!(matches!(port_check("http"), Verdict::Reject(_)));
    assert!(matches!(port_check(""), Verdict::Reject(_)));
}

proptest! {
    #[test]
    fn prop_port_range_accepts_every_valid_port(port in 1u32..=65535) {
        prop_assert_eq!(port_check(&port.to_string()), Verdict::Accept);
    }

    #[test]
    fn prop_port_range_rejects_out_of_range(port in 65536u64..10_000_000) {
        prop_assert!(matches!(port_check(&port.to_string()), Verdict::Reject(_)));
    }

    #[test]
    fn prop_port_range_rejects_non_numeric(value in "[a-zA-Z][a-zA-Z_-]{0,12}") {
        prop_assert!(matches!(port_check(&value), Verdict::Reject(_)));
    }

    #[test]
    fn prop_validation_is_deterministic(
        port in ".{0,8}",
        hosts in "[a-z0-9., ]{0,40}",
        debug in "(true|false|yes|no|1|0|maybe)",
    ) {
        let schema = Schema::new()
            .with_field("PORT", FieldSpec::integer().with_validator("port_range"))
            .with_field("ALLOWED_HOSTS", FieldSpec::list())
            .with_field("DEBUG", FieldSpec::boolean());
        let env = MapEnv::new()
            .with("PORT", port)
            .with("ALLOWED_HOSTS", hosts)
            .with("DEBUG", debug);
        let validator = validator(schema, env);

        let first = validator.validate();
        let second = validator.validate();

        prop_assert_eq!(first.is_valid, second.is_valid);
        prop_assert_eq!(&first.validated_values, &second.validated_values);
        prop_assert_eq!(&first.errors, &second.errors);
        prop_assert_eq!(&first.warnings, &second.warnings);
        prop_assert_eq!(first.security_score, second.security_score);
    }

    #[test]
    fn prop_sensitive_values_never_exported(secret in "[A-Za-z0-9]{16,40}") {
        let schema = Schema::new()
            .with_field("SECRET_KEY", FieldSpec::string().required().sensitive())
            .with_field("LOG_LEVEL", FieldSpec::string().with_default("info"));
        let validator = validator(schema, MapEnv::new().with("SECRET_KEY", secret.clone()));
        let result = validator.validate();
        prop_assert!(result.is_valid);

        let exporters: [&dyn Exporter; 2] = [&JsonExporter, &YamlExporter];
        for exporter in exporters {
            let values = exporter.export_values(&result, validator.schema()).unwrap();
            let again = exporter.export_values(&result, validator.schema()).unwrap();
            prop_assert_eq!(&values, &again);
            prop_assert!(!values.contains(&secret));

            let report = ValidationReport::from_result(&result, validator.schema());
            let rendered = exporter.export_report(&report).unwrap();
            prop_assert!(!rendered.contains(&secret));
        }
    }

    #[test]
    fn prop_defaults_fill_an_empty_environment(
        defaults in proptest::collection::btree_map("[A-Z][A-Z0-9_]{0,10}", -1000i64..1000, 0..8)
    ) {
        let schema: Schema = defaults
            .iter()
            .map(|(name, value)| (name.clone(), FieldSpec::integer().with_default(*value)))
            .collect();
        let result = validator(schema, MapEnv::new()).validate();

        prop_assert!(result.is_valid);
        prop_assert_eq!(result.validated_values.len(), defaults.len());
        for (name, value) in &defaults {
            prop_assert_eq!(result.get(name), Some(&EnvValue::Integer(*value)));
        }
    }

    #[test]
    fn prop_each_missing_required_field_has_one_error(
        names in proptest::collection::btree_set("[A-Z][A-Z0-9_]{0,10}", 1..6)
    ) {
        let schema: Schema = names
            .iter()
            .map(|name| (name.clone(), FieldSpec::string().required()))
            .collect();
        let result = validator(schema, MapEnv::new()).validate();

        prop_assert!(!result.is_valid);
        prop_assert_eq!(result.errors.len(), names.len());
        for name in &names {
            let errors: Vec<_> = result.errors_for(name).collect();
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors[0].kind, IssueKind::MissingRequired);
        }
    }
}
