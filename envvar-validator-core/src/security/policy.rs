//! Security scoring policy.
//!
//! The point table and weak-value patterns used by the scorer. Every
//! deduction is configurable; the defaults are documented on
//! [`ScoringPolicy::default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Point table and heuristics for the security scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Points removed for a sensitive value matching a weak pattern
    pub weak_value_deduction: u8,
    /// Points removed for a sensitive value shorter than `min_secret_length`
    pub short_secret_deduction: u8,
    /// Points removed for a debug flag enabled outside development
    pub debug_enabled_deduction: u8,
    /// Points removed per missing sensitive field in production
    pub missing_sensitive_deduction: u8,
    /// Sensitive strings shorter than this are considered short
    pub min_secret_length: usize,
    /// Score reported when scoring itself fails
    pub neutral_score: u8,
    /// Regular expressions matched against sensitive string values
    pub weak_value_patterns: Vec<String>,
    /// Boolean variables treated as debug switches
    pub debug_flags: Vec<String>,
}

/// Validation errors for scoring policies.
#[derive(Debug, Error)]
pub enum PolicyValidationError {
    #[error("{field} must be between 0 and 100, got {value}")]
    DeductionOutOfRange { field: &'static str, value: u8 },
    #[error("neutral_score must be between 0 and 100, got {0}")]
    InvalidNeutralScore(u8),
    #[error("min_secret_length must be at least 1")]
    InvalidMinSecretLength,
    #[error("weak value pattern #{index} is not a valid regular expression: {message}")]
    InvalidPattern { index: usize, message: String },
}

impl Default for ScoringPolicy {
    /// Defaults: weak value 20, short secret 10, debug outside development 15,
    /// missing sensitive field in production 5, neutral score 50.
    fn default() -> Self {
        Self {
            weak_value_deduction: 20,
            short_secret_deduction: 10,
            debug_enabled_deduction: 15,
            missing_sensitive_deduction: 5,
            min_secret_length: 16,
            neutral_score: 50,
            weak_value_patterns: [
                r"(?i)(^|[-_])(demo|example|sample|changeme|placeholder)([-_]|$)",
                r"(?i)^(test|dev|dummy|fake)[-_]",
                r"(?i)insecure",
                r"(?i)^(password|secret|admin|123456|qwerty|letmein)$",
                r"(?i)your[-_].*[-_]here",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            debug_flags: ["DEBUG", "FLASK_DEBUG", "DJANGO_DEBUG", "APP_DEBUG"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ScoringPolicy {
    /// Creates a policy with default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the weak value deduction.
    pub fn with_weak_value_deduction(mut self, points: u8) -> Self {
        self.weak_value_deduction = points;
        self
    }

    /// Builder method to set the short secret deduction.
    pub fn with_short_secret_deduction(mut self, points: u8) -> Self {
        self.short_secret_deduction = points;
        self
    }

    /// Builder method to set the debug flag deduction.
    pub fn with_debug_enabled_deduction(mut self, points: u8) -> Self {
        self.debug_enabled_deduction = points;
        self
    }

    /// Builder method to set the per-field missing sensitive deduction.
    pub fn with_missing_sensitive_deduction(mut self, points: u8) -> Self {
        self.missing_sensitive_deduction = points;
        self
    }

    pub fn with_min_secret_length(mut self, length: usize) -> Self {
        self.min_secret_length = length;
        self
    }

    pub fn with_neutral_score(mut self, score: u8) -> Self {
        self.neutral_score = score;
        self
    }

    /// Builder method to add a weak value pattern.
    pub fn with_weak_value_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.weak_value_patterns.push(pattern.into());
        self
    }

    /// Builder method to add a debug flag name.
    pub fn with_debug_flag(mut self, name: impl Into<String>) -> Self {
        self.debug_flags.push(name.into());
        self
    }

    /// Validates the policy.
    ///
    /// Returns an error if a weight falls outside 0..=100 or a pattern does
    /// not compile.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        for (field, value) in [
            ("weak_value_deduction", self.weak_value_deduction),
            ("short_secret_deduction", self.short_secret_deduction),
            ("debug_enabled_deduction", self.debug_enabled_deduction),
            ("missing_sensitive_deduction", self.missing_sensitive_deduction),
        ] {
            if value > 100 {
                return Err(PolicyValidationError::DeductionOutOfRange { field, value });
            }
        }
        if self.neutral_score > 100 {
            return Err(PolicyValidationError::InvalidNeutralScore(self.neutral_score));
        }
        if self.min_secret_length == 0 {
            return Err(PolicyValidationError::InvalidMinSecretLength);
        }
        for (index, pattern) in self.weak_value_patterns.iter().enumerate() {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(PolicyValidationError::InvalidPattern {
                    index,
                    message: e.to_string(),
                });
            }
        }
        Ok(())
    }
}
