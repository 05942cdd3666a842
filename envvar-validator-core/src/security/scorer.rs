//! Heuristic security scoring over validated values.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::policy::ScoringPolicy;
use crate::error::{EnvValidatorError, Result};
use crate::models::{EnvValue, EnvironmentType, ValidatedValues};
use crate::schema::Schema;

/// Category of a security finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    WeakSecret,
    ShortSecret,
    DebugEnabled,
    MissingSensitive,
    InlineCredentials,
    /// The scorer could not run and reported the neutral score
    ScanFailure,
}

/// One security finding. Never carries the inspected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIssue {
    pub variable_name: String,
    pub category: IssueCategory,
    pub message: String,
    /// Points this finding removed from the score
    pub deduction: u8,
}

impl SecurityIssue {
    pub fn new(
        variable_name: impl Into<String>,
        category: IssueCategory,
        message: impl Into<String>,
        deduction: u8,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            category,
            message: message.into(),
            deduction,
        }
    }
}

/// Output of one scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScan {
    /// 0-100, higher is safer
    pub score: u8,
    pub issues: Vec<SecurityIssue>,
    /// True when scoring failed and `score` is the policy's neutral score
    #[serde(default)]
    pub degraded: bool,
}

impl SecurityScan {
    /// Builds a scan from findings, starting at 100 and saturating at 0.
    pub fn from_issues(issues: Vec<SecurityIssue>) -> Self {
        let score = issues
            .iter()
            .fold(100_u8, |score, issue| score.saturating_sub(issue.deduction));
        Self {
            score,
            issues,
            degraded: false,
        }
    }

    /// The advisory result reported when scoring could not run.
    pub fn neutral(score: u8, reason: &str) -> Self {
        Self {
            score: score.min(100),
            issues: vec![SecurityIssue::new(
                "*",
                IssueCategory::ScanFailure,
                format!("Security scoring failed: {reason}"),
                0,
            )],
            degraded: true,
        }
    }
}

/// Scores validated values against a [`ScoringPolicy`].
///
/// Scores are advisory and never affect validity.
#[derive(Debug, Clone)]
pub struct SecurityScorer {
    policy: ScoringPolicy,
    patterns: std::result::Result<Vec<Regex>, String>,
}

impl Default for SecurityScorer {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

impl SecurityScorer {
    /// Creates a scorer, compiling the policy's weak-value patterns once.
    pub fn new(policy: ScoringPolicy) -> Self {
        let patterns = policy
            .weak_value_patterns
            .iter()
            .map(|pattern| Regex::new(pattern).map_err(|e| e.to_string()))
            .collect();
        Self { policy, patterns }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// True if `value` matches any weak-value pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the policy's patterns did not compile.
    pub fn is_weak(&self, value: &str) -> Result<bool> {
        let patterns = self.patterns.as_ref().map_err(|e| {
            EnvValidatorError::configuration(format!("invalid weak value pattern: {e}"))
        })?;
        Ok(patterns.iter().any(|re| re.is_match(value)))
    }

    pub(crate) fn is_short(&self, value: &str) -> bool {
        value.chars().count() < self.policy.min_secret_length
    }

    /// Scores `values` declared by `schema` for `environment`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the policy cannot be applied.
    pub fn score(
        &self,
        values: &ValidatedValues,
        schema: &Schema,
        environment: EnvironmentType,
    ) -> Result<SecurityScan> {
        self.score_with_rejected(values, &[], schema, environment)
    }

    /// Like [`Self::score`], where `rejected` names variables that were set
    /// but failed validation. Those are absent from `values` without being
    /// unset, so they never count as missing.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the policy cannot be applied.
    pub fn score_with_rejected(
        &self,
        values: &ValidatedValues,
        rejected: &[&str],
        schema: &Schema,
        environment: EnvironmentType,
    ) -> Result<SecurityScan> {
        let mut issues = Vec::new();

        for (name, spec) in schema.iter() {
            let value = values.get(name);

            if spec.sensitive {
                match value {
                    Some(value @ (EnvValue::String(_) | EnvValue::List(_))) => {
                        self.inspect_secret(name, value, &mut issues)?;
                    }
                    Some(_) => {}
                    None if environment == EnvironmentType::Production
                        && !spec.required
                        && !rejected.contains(&name) =>
                    {
                        issues.push(SecurityIssue::new(
                            name,
                            IssueCategory::MissingSensitive,
                            "Sensitive variable is not set in production",
                            self.policy.missing_sensitive_deduction,
                        ));
                    }
                    None => {}
                }
            }

            if environment != EnvironmentType::Development
                && self.policy.debug_flags.iter().any(|flag| flag == name)
                && value.and_then(EnvValue::as_bool) == Some(true)
            {
                issues.push(SecurityIssue::new(
                    name,
                    IssueCategory::DebugEnabled,
                    format!("Debug mode is enabled in a {environment} environment"),
                    self.policy.debug_enabled_deduction,
                ));
            }
        }

        let scan = SecurityScan::from_issues(issues);
        tracing::debug!(
            "Security score {} with {} issue(s)",
            scan.score,
            scan.issues.len()
        );
        Ok(scan)
    }

    /// Like [`Self::score`], degrading to the neutral score on failure.
    pub fn score_or_neutral(
        &self,
        values: &ValidatedValues,
        rejected: &[&str],
        schema: &Schema,
        environment: EnvironmentType,
    ) -> SecurityScan {
        self.score_with_rejected(values, rejected, schema, environment)
            .unwrap_or_else(|e| {
                tracing::warn!("Security scoring degraded to neutral score: {}", e);
                SecurityScan::neutral(self.policy.neutral_score, &e.to_string())
            })
    }

    fn inspect_secret(
        &self,
        name: &str,
        value: &EnvValue,
        issues: &mut Vec<SecurityIssue>,
    ) -> Result<()> {
        for input in value.check_inputs() {
            if self.is_weak(&input)? {
                issues.push(SecurityIssue::new(
                    name,
                    IssueCategory::WeakSecret,
                    "Sensitive value matches a known weak or demo pattern",
                    self.policy.weak_value_deduction,
                ));
            } else if self.is_short(&input) {
                issues.push(SecurityIssue::new(
                    name,
                    IssueCategory::ShortSecret,
                    format!(
                        "Sensitive value is shorter than {} characters",
                        self.policy.min_secret_length
                    ),
                    self.policy.short_secret_deduction,
                ));
            }
        }
        Ok(())
    }
}
