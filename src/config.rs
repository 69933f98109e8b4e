use crate::error::Result;
use crate::hash::HashAlgorithm;
use crate::mining::MiningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for a simulator run. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Digest algorithm for the chain.
    pub algorithm: HashAlgorithm,
    /// Proof-of-work settings used by `mine`.
    pub mining: MiningConfig,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            mining: MiningConfig::default(),
            log_level: "warn".into(),
        }
    }
}

impl SimulatorConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    #[test]
    fn defaults_without_file() {
        let cfg = SimulatorConfig::load_or_default(None).unwrap();
        assert_eq!(cfg, SimulatorConfig::default());
        assert_eq!(cfg.algorithm, HashAlgorithm::Sha256);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chainviz.json");
        fs::write(&path, r#"{"algorithm": "checksum", "mining": {"difficulty": 5}}"#).unwrap();

        let cfg = SimulatorConfig::load(&path).unwrap();
        assert_eq!(cfg.algorithm, HashAlgorithm::Checksum);
        assert_eq!(cfg.mining.difficulty, 5);
        assert_eq!(cfg.mining.max_attempts, 1000);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn malformed_file_is_a_serde_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SimulatorConfig::load(&path),
            Err(ChainError::Serde(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SimulatorConfig::load(&tmp.path().join("absent.json"));
        assert!(matches!(result, Err(ChainError::Io(_))));
    }
}
