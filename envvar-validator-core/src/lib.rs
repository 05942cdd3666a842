//! Core validation engine for envvar-validator.
//!
//! This crate turns a declarative [`Schema`] into a typed, checked view of the
//! process environment. A validation pass coerces every declared variable,
//! runs its validators, optionally flags undeclared variables, scores the
//! configuration for common security mistakes and returns one
//! [`ValidationResult`].
//!
//! # Security Guarantees
//! - Values of sensitive fields never appear in logs, errors or exports
//! - Validation performs no network or disk I/O
//! - Environment access goes through [`env::EnvSource`], so tests never have
//!   to mutate the real process environment
//!
//! # Architecture
//! - [`coercion`]: raw string to `str`/`bool`/`int`/`list`
//! - [`validators`]: built-in checks and the name registry
//! - [`evaluator`]: per-field default, coercion and validator pipeline
//! - [`validator`]: the orchestrator
//! - [`security`], [`monitoring`], [`export`]: read-only consumers of results
//! - [`frameworks`]: Django, FastAPI and Flask conventions

pub mod coercion;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod frameworks;
pub mod logging;
pub mod models;
pub mod monitoring;
pub mod schema;
pub mod security;
pub mod validator;
pub mod validators;

// Re-export commonly used types
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{EnvValidatorError, Result, ValidationError};
pub use export::{Exporter, JsonExporter, ValidationReport, YamlExporter, render_env_template};
pub use frameworks::{FrameworkPreset, FrameworkValidator};
pub use models::{
    EnvValue, EnvironmentType, FieldType, IssueKind, PerformanceMetrics, ResultMetadata,
    ValidatedValues, ValidationIssue, ValidationResult,
};
pub use schema::{FieldSpec, Schema};
pub use security::{ScoringPolicy, SecurityScanner, SecurityScorer};
pub use validator::{EnvironmentValidator, ValidatorOptions};
pub use validators::{CustomValidator, ValidatorMessage, ValidatorRef, ValidatorRegistry};
