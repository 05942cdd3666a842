//! Whole-environment security scan.
//!
//! Unlike the scorer, the scanner needs no schema: it inspects every variable
//! whose name suggests it holds a credential.

use super::policy::ScoringPolicy;
use super::scorer::{IssueCategory, SecurityIssue, SecurityScorer};
use crate::env::EnvSource;

/// Name fragments that mark a variable as secret-bearing.
pub const SECRET_NAME_MARKERS: &[&str] =
    &["PASSWORD", "PASSWD", "SECRET", "TOKEN", "KEY", "CREDENTIAL", "DSN"];

/// True if `name` looks like it holds a credential.
pub fn looks_secret(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    SECRET_NAME_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Scans an environment for weak credentials.
#[derive(Debug, Clone, Default)]
pub struct SecurityScanner {
    scorer: SecurityScorer,
}

impl SecurityScanner {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            scorer: SecurityScorer::new(policy),
        }
    }

    /// Reports weak, short or empty secrets and URLs with inline passwords.
    ///
    /// Findings carry a zero deduction; use the scorer for a rating.
    pub fn scan_environment(&self, source: &dyn EnvSource) -> Vec<SecurityIssue> {
        let mut issues = Vec::new();

        for name in source.names() {
            let Some(value) = source.get(&name) else {
                continue;
            };

            if has_inline_password(&value) {
                issues.push(SecurityIssue::new(
                    &name,
                    IssueCategory::InlineCredentials,
                    "Connection string embeds a password",
                    0,
                ));
            }

            if !looks_secret(&name) {
                continue;
            }

            if value.trim().is_empty() {
                issues.push(SecurityIssue::new(
                    &name,
                    IssueCategory::ShortSecret,
                    "Secret-bearing variable is empty",
                    0,
                ));
            } else if self.scorer.is_weak(&value).unwrap_or_else(|e| {
                tracing::warn!("Skipping weak value check for '{}': {}", name, e);
                false
            }) {
                issues.push(SecurityIssue::new(
                    &name,
                    IssueCategory::WeakSecret,
                    "Value matches a known weak or demo pattern",
                    0,
                ));
            } else if self.scorer.is_short(&value) && !value.contains("://") {
                issues.push(SecurityIssue::new(
                    &name,
                    IssueCategory::ShortSecret,
                    format!(
                        "Value is shorter than {} characters",
                        self.scorer.policy().min_secret_length
                    ),
                    0,
                ));
            }
        }

        tracing::debug!("Environment scan found {} issue(s)", issues.len());
        issues
    }
}

fn has_inline_password(value: &str) -> bool {
    value.contains("://")
        && url::Url::parse(value)
            .ok()
            .and_then(|parsed| parsed.password().map(|password| !password.is_empty()))
            .unwrap_or(false)
}
