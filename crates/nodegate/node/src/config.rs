//! Node adapter configuration

use crate::error::{NodeStateError, Result};
use nodegate_dispatch::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the adapter reaches the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// Embedded in the node process, using its services directly
    #[default]
    InProcess,
    /// Separate process, talking to the node over RPC
    Remote,
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::InProcess => write!(f, "in-process"),
            DeploymentMode::Remote => write!(f, "remote"),
        }
    }
}

/// Node adapter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAdapterConfig {
    pub mode: DeploymentMode,
    pub dispatcher: DispatcherConfig,
}

impl NodeAdapterConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: NodeAdapterConfig =
            toml::from_str(contents).map_err(|e| NodeStateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(NodeAdapterConfig::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| NodeStateError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatcher
            .validate()
            .map_err(|e| NodeStateError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NodeAdapterConfig::default();
        assert_eq!(config.mode, DeploymentMode::InProcess);
        assert_eq!(config.dispatcher, DispatcherConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let config = NodeAdapterConfig::from_toml_str(
            r#"
            mode = "remote"

            [dispatcher]
            progress_channel_capacity = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, DeploymentMode::Remote);
        assert_eq!(config.dispatcher.progress_channel_capacity, 64);
        assert!(config.dispatcher.log_progress_updates);
    }

    #[test]
    fn test_invalid_toml() {
        let result = NodeAdapterConfig::from_toml_str("mode = [");
        assert!(matches!(result, Err(NodeStateError::Config(_))));

        let result = NodeAdapterConfig::from_toml_str(r#"mode = "clustered""#);
        assert!(matches!(result, Err(NodeStateError::Config(_))));
    }

    #[test]
    fn test_invalid_dispatcher_section() {
        let result =
            NodeAdapterConfig::from_toml_str("[dispatcher]\nprogress_channel_capacity = 0\n");
        assert!(matches!(result, Err(NodeStateError::Config(_))));
    }

    #[test]
    fn test_load_missing_config() {
        let config = NodeAdapterConfig::load("/nonexistent/path/nodegate.toml").unwrap();
        assert_eq!(config, NodeAdapterConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"in-process\"").unwrap();
        writeln!(file, "[dispatcher]").unwrap();
        writeln!(file, "log_progress_updates = false").unwrap();

        let config = NodeAdapterConfig::load(file.path()).unwrap();
        assert_eq!(config.mode, DeploymentMode::InProcess);
        assert!(!config.dispatcher.log_progress_updates);
    }
}
