//! Configuration drift detection.
//!
//! Snapshots store a salted SHA-256 fingerprint per variable instead of the
//! value, so a persisted snapshot never contains secrets in clear text.
//!
//! # Security Guarantees
//!
//! - Each snapshot draws a fresh 16-byte salt, so fingerprints of weak values
//!   cannot be matched against precomputed dictionaries
//! - Comparisons re-fingerprint the current values with the baseline's salt

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{EnvValidatorError, Result};
use crate::models::{EnvValue, EnvironmentType, ValidationResult};

/// Salt size for snapshot fingerprints: 128 bits
pub const SNAPSHOT_SALT_SIZE: usize = 16;

/// Fingerprints of every validated value at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub captured_at: DateTime<Utc>,
    pub environment_type: EnvironmentType,
    /// Random salt mixed into every fingerprint of this snapshot
    pub salt: Vec<u8>,
    /// Variable name to hex SHA-256 fingerprint
    pub fingerprints: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    /// Fingerprints the validated values of `result` under a fresh salt.
    pub fn capture(result: &ValidationResult) -> Self {
        let mut salt = vec![0_u8; SNAPSHOT_SALT_SIZE];
        rand::rng().fill_bytes(&mut salt);
        Self::capture_with_salt(result, salt)
    }

    /// Fingerprints the validated values of `result` under `salt`.
    pub fn capture_with_salt(result: &ValidationResult, salt: Vec<u8>) -> Self {
        let fingerprints = result
            .validated_values
            .iter()
            .map(|(name, value)| (name.to_string(), fingerprint(&salt, name, value)))
            .collect();
        Self {
            captured_at: result.metadata.validated_at,
            environment_type: result.metadata.environment_type,
            salt,
            fingerprints,
        }
    }

    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EnvValidatorError::serialization("encoding drift snapshot", e))
    }

    /// # Errors
    ///
    /// Returns a serialization error for malformed snapshots.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| EnvValidatorError::serialization("parsing drift snapshot", e))
    }
}

fn fingerprint(salt: &[u8], name: &str, value: &EnvValue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(name.as_bytes());
    hasher.update([0_u8]);
    hasher.update(value.field_type().to_string().as_bytes());
    hasher.update([0_u8]);
    match value {
        EnvValue::List(items) => {
            for item in items {
                hasher.update(item.as_bytes());
                hasher.update([0x1f_u8]);
            }
        }
        scalar => hasher.update(scalar.to_string().as_bytes()),
    }
    format!("{:x}", hasher.finalize())
}

/// Differences between a baseline snapshot and a later result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub baseline_at: DateTime<Utc>,
    pub compared_at: DateTime<Utc>,
    /// Variables validated now but absent from the baseline
    pub added: Vec<String>,
    /// Variables in the baseline that no longer validate
    pub removed: Vec<String>,
    /// Variables whose value changed
    pub changed: Vec<String>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }
}

/// Compares validation results against a baseline snapshot.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    baseline: ConfigSnapshot,
}

impl DriftDetector {
    pub fn new(baseline: ConfigSnapshot) -> Self {
        Self { baseline }
    }

    /// Uses `result` as the baseline.
    pub fn from_result(result: &ValidationResult) -> Self {
        Self::new(ConfigSnapshot::capture(result))
    }

    pub fn baseline(&self) -> &ConfigSnapshot {
        &self.baseline
    }

    /// Replaces the baseline with `result`.
    pub fn rebaseline(&mut self, result: &ValidationResult) {
        self.baseline = ConfigSnapshot::capture(result);
    }

    /// Reports added, removed and changed variables, each sorted by name.
    pub fn compare(&self, result: &ValidationResult) -> DriftReport {
        let current = ConfigSnapshot::capture_with_salt(result, self.baseline.salt.clone());
        let baseline = &self.baseline.fingerprints;

        let added = current
            .fingerprints
            .keys()
            .filter(|name| !baseline.contains_key(*name))
            .cloned()
            .collect();
        let removed = baseline
            .keys()
            .filter(|name| !current.fingerprints.contains_key(*name))
            .cloned()
            .collect();
        let changed = current
            .fingerprints
            .iter()
            .filter(|(name, hash)| baseline.get(*name).is_some_and(|old| old != *hash))
            .map(|(name, _)| name.clone())
            .collect();

        let report = DriftReport {
            baseline_at: self.baseline.captured_at,
            compared_at: current.captured_at,
            added,
            removed,
            changed,
        };
        if report.has_drift() {
            tracing::info!(
                "Configuration drift detected: {} added, {} removed, {} changed",
                report.added.len(),
                report.removed.len(),
                report.changed.len()
            );
        }
        report
    }
}
