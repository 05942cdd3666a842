//! Shared logging utilities.
//!
//! Provides consistent logging configuration for the binary and embedding
//! applications, plus the audit trail for validation passes.

use crate::Result;
use crate::models::ValidationResult;

/// Target used for audit events, so they can be routed separately.
pub const AUDIT_TARGET: &str = "envvar_validator::audit";

/// Maps CLI verbosity flags to a log level.
///
/// `quiet` wins over any verbosity; otherwise 0=INFO, 1=DEBUG, 2+=TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns a configuration error if a global subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use envvar_validator_core::logging::init_logging;
///
/// // Initialize at DEBUG level
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::EnvValidatorError::configuration(format!(
                "Failed to initialize logging: {}",
                e
            ))
        })?;

    Ok(())
}

/// Records a validation pass on the audit target.
///
/// Only counts, the score and the environment type are logged; variable
/// values never are.
pub fn audit_validation(event: &str, result: &ValidationResult) {
    tracing::info!(
        target: AUDIT_TARGET,
        event,
        is_valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        security_score = result.security_score.map(i64::from),
        environment = %result.metadata.environment_type,
        framework = result.metadata.framework.as_deref(),
        "Validation audit"
    );
}
