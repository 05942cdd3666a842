//! Read-only monitoring over validation results.
//!
//! - **Health**: classify a configuration as healthy, degraded or unhealthy
//! - **Drift**: detect variables added, removed or changed since a baseline
//!
//! # Example
//! ```rust
//! use envvar_validator_core::env::MapEnv;
//! use envvar_validator_core::monitoring::{DriftDetector, HealthChecker, HealthStatus};
//! use envvar_validator_core::schema::{FieldSpec, Schema};
//! use envvar_validator_core::validator::EnvironmentValidator;
//!
//! let schema = Schema::new().with_field("PORT", FieldSpec::integer().with_default(8000));
//! let validator = EnvironmentValidator::new(schema)?.with_source(MapEnv::new());
//!
//! let baseline = validator.validate();
//! assert_eq!(HealthChecker::new().assess(&baseline).status, HealthStatus::Healthy);
//!
//! let detector = DriftDetector::from_result(&baseline);
//! let later = validator.validate_source(&MapEnv::new().with("PORT", "9000"));
//! assert_eq!(detector.compare(&later).changed, vec!["PORT"]);
//! # Ok::<(), envvar_validator_core::EnvValidatorError>(())
//! ```

mod drift;
mod health;

pub use drift::{ConfigSnapshot, DriftDetector, DriftReport};
pub use health::{DEFAULT_MIN_SCORE, HealthChecker, HealthReport, HealthStatus};
