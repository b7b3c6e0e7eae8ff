// In: src/config.rs

//! The single source of truth for all bridge configuration.
//!
//! `BridgeConfig` is created once at the application boundary (from JSON, the
//! environment, or `Default`) and then shared read-only as an `Arc<BridgeConfig>`
//! by the `Bridge` facade and the binding generator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Environment variable naming a JSON config file for the process-wide bridge.
pub const CONFIG_ENV_VAR: &str = "ANIMAL_BRIDGE_CONFIG";

/// Where printing method thunks (`Animal_eat`, `Cat_scratch`, ...) write their line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

/// The unified configuration for the bridge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Upper bound on simultaneously live handles. Constructors return the null
    /// sentinel once it is reached. `None` means bounded only by the index space.
    #[serde(default)]
    pub max_live_handles: Option<usize>,

    /// If true, a subtype's binding re-exposes the methods declared on its base
    /// chain (e.g. `Cat_eat`), dispatching dynamically like the base symbol does.
    #[serde(default = "default_true")]
    pub emit_inherited_methods: bool,

    /// Destination of method output lines.
    #[serde(default)]
    pub output: OutputTarget,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_live_handles: None,
            emit_inherited_methods: true,
            output: OutputTarget::default(),
        }
    }
}

impl BridgeConfig {
    /// Parses a config from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Loads the file named by `ANIMAL_BRIDGE_CONFIG`, or the default when unset.
    pub fn from_env() -> Result<Self, BridgeError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert!(config.emit_inherited_methods);
    }

    #[test]
    fn test_partial_json_overrides_fields() {
        let config =
            BridgeConfig::from_json_str(r#"{"max_live_handles": 8, "output": "stderr"}"#).unwrap();
        assert_eq!(config.max_live_handles, Some(8));
        assert_eq!(config.output, OutputTarget::Stderr);
        assert!(config.emit_inherited_methods);
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        let err = BridgeConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
