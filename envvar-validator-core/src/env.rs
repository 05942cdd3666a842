//! Environment sources.
//!
//! Validation reads variables through [`EnvSource`] so tests and embedding
//! applications can supply a fixed mapping instead of mutating the real
//! process environment.

use std::collections::BTreeMap;

/// Read-only access to a set of environment variables.
pub trait EnvSource: Send + Sync {
    /// Current value of `name`, if set.
    fn get(&self, name: &str) -> Option<String>;

    /// Names of every variable visible through this source, sorted.
    fn names(&self) -> Vec<String>;
}

/// The real process environment, read at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        match std::env::var(name) {
            Ok(value) => Some(value),
            Err(std::env::VarError::NotPresent) => None,
            Err(std::env::VarError::NotUnicode(_)) => {
                tracing::warn!(
                    "Ignoring environment variable '{}': value is not valid UTF-8",
                    name
                );
                None
            }
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::env::vars_os()
            .filter_map(|(name, _)| name.into_string().ok())
            .collect();
        names.sort();
        names
    }
}

/// A fixed mapping of variables.
///
/// ```rust
/// use envvar_validator_core::env::{EnvSource, MapEnv};
///
/// let env = MapEnv::new().with("PORT", "8080").with("DEBUG", "false");
/// assert_eq!(env.get("PORT").as_deref(), Some("8080"));
/// assert_eq!(env.names(), vec!["DEBUG", "PORT"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set one variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
