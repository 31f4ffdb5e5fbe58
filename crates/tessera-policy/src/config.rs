//! Verifier configuration
//!
//! Loaded from YAML:
//!
//! ```yaml
//! extension_timeout_ms: 5000
//! extending_allowed: true
//! hash_algorithm: SHA-256
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tessera_core::{DataHasher, HashAlgorithm};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/io: {0}")]
    Io(#[from] std::io::Error),

    #[error("CONFIG/parse: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Defaults applied to every verification context built with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Upper bound on one extension call; 0 disables the deadline
    pub extension_timeout_ms: u64,

    /// Whether contexts allow extension unless overridden
    pub extending_allowed: bool,

    /// Algorithm for hashing documents
    pub hash_algorithm: HashAlgorithm,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            extension_timeout_ms: 30_000,
            extending_allowed: false,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl VerifierConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn extension_timeout(&self) -> Option<Duration> {
        (self.extension_timeout_ms > 0).then(|| Duration::from_millis(self.extension_timeout_ms))
    }

    /// Fresh hasher for the configured algorithm
    pub fn hasher(&self) -> DataHasher {
        DataHasher::new(self.hash_algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.extension_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.extending_allowed);
        assert_eq!(config.hasher().algorithm(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_from_yaml() {
        let config = VerifierConfig::from_yaml(
            "extension_timeout_ms: 250\nextending_allowed: true\nhash_algorithm: BLAKE3\n",
        )
        .unwrap();
        assert_eq!(config.extension_timeout(), Some(Duration::from_millis(250)));
        assert!(config.extending_allowed);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = VerifierConfig::from_yaml("extension_timeout_ms: 0\n").unwrap();
        assert_eq!(config.extension_timeout(), None);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = VerifierConfig::from_yaml("extension_timeout: 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = VerifierConfig::from_file("/nonexistent/tessera.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
