//! Health checks over validation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ValidationResult;
use crate::validator::EnvironmentValidator;

/// Minimum security score for a healthy configuration by default.
pub const DEFAULT_MIN_SCORE: u8 = 70;

/// Overall health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Valid, no warnings, score at or above the threshold
    Healthy,
    /// Valid, but with warnings or a low score
    Degraded,
    /// Validation errors present
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Point-in-time health of a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checked_at: DateTime<Utc>,
    pub is_valid: bool,
    pub security_score: Option<u8>,
    pub errors_count: usize,
    pub warnings_count: usize,
    /// Human-readable reasons for a non-healthy status
    pub details: Vec<String>,
}

/// Classifies validation results into health states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChecker {
    min_score: u8,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the score threshold, clamped to 0-100.
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        if min_score > 100 {
            tracing::warn!("min_score {} clamped to 100", min_score);
        }
        self.min_score = min_score.min(100);
        self
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Runs a validation pass and classifies it.
    pub fn check(&self, validator: &EnvironmentValidator) -> HealthReport {
        self.assess(&validator.validate())
    }

    /// Classifies an existing result.
    pub fn assess(&self, result: &ValidationResult) -> HealthReport {
        let mut details = Vec::new();

        if !result.is_valid {
            details.push(format!("{} validation error(s)", result.errors.len()));
        }
        if !result.warnings.is_empty() {
            details.push(format!("{} warning(s)", result.warnings.len()));
        }
        if let Some(score) = result.security_score
            && score < self.min_score
        {
            details.push(format!(
                "security score {score} is below the threshold of {}",
                self.min_score
            ));
        }

        let status = if !result.is_valid {
            HealthStatus::Unhealthy
        } else if details.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        tracing::debug!("Health check: {}", status);

        HealthReport {
            status,
            checked_at: Utc::now(),
            is_valid: result.is_valid,
            security_score: result.security_score,
            errors_count: result.errors.len(),
            warnings_count: result.warnings.len(),
            details,
        }
    }
}
