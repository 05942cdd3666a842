//! Security scoring and scanning.
//!
//! - **Scorer**: advisory 0-100 rating of a validated configuration
//! - **Scanner**: schema-less sweep of a whole environment for weak secrets
//!
//! # Security Guarantees
//! - Findings name variables, never the values they hold
//! - Scores never affect validity
//! - A scorer failure degrades to the policy's neutral score instead of
//!   aborting validation

mod policy;
mod scanner;
mod scorer;

pub use policy::{PolicyValidationError, ScoringPolicy};
pub use scanner::{SECRET_NAME_MARKERS, SecurityScanner, looks_secret};
pub use scorer::{IssueCategory, SecurityIssue, SecurityScan, SecurityScorer};
