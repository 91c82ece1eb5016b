//! Type-safe backend identifier
//!
//! Backend identifiers appear in the routing table, the scoreboard and the
//! trace. Wrapping them keeps them from being confused with model names.

use crate::config::{BackendConfig, Config};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a configured `[[backends]]` entry
///
/// # Validation
/// - `new()`: checks the identifier against a `Config`, returns `Result`
/// - `From<String>` and `From<&str>`: no validation. Unknown identifiers are
///   caught by `Config::validate()` or surface as `AppError::UnknownBackend`
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    /// Create a validated BackendId
    ///
    /// # Errors
    /// Returns an error if no configured backend carries this identifier.
    pub fn new(id: impl Into<String>, config: &Config) -> Result<Self, String> {
        let id = Self(id.into());
        if config.backend(&id).is_some() {
            Ok(id)
        } else {
            Err(format!(
                "Unknown backend: '{}'. Available backends: {}",
                id,
                config
                    .backends
                    .iter()
                    .map(|b| b.id().as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&BackendConfig> for BackendId {
    fn from(backend: &BackendConfig) -> Self {
        backend.id().clone()
    }
}

impl From<String> for BackendId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
