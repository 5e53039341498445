//! Bootstrap configuration for the wikiinit CLI
//!
//! The bootstrap file tells the CLI where the initializer settings live and
//! how to log. It is loaded from YAML or TOML (by extension):
//!
//! ```yaml
//! config_files:
//!   - ~/.xwiki/xwiki.properties
//!   - /etc/xwiki/wikiinit.yaml
//! env_prefix: WIKIINIT_
//! platform_context_path: /xwiki
//! logging:
//!   level: debug
//!   json: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use wikiinit_config_file::{EnvConfigSource, FileConfigSource, LayeredConfigSource};
use wikiinit_observability::LoggingConfig;

/// Bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Settings files, highest precedence first
    #[serde(default)]
    pub config_files: Vec<PathBuf>,

    /// Prefix of environment overrides; unset disables them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_prefix: Option<String>,

    /// Servlet context path the platform is deployed under
    #[serde(default = "default_platform_context_path")]
    pub platform_context_path: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_platform_context_path() -> String {
    "/xwiki".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            config_files: Vec::new(),
            env_prefix: Some("WIKIINIT_".to_string()),
            platform_context_path: default_platform_context_path(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load bootstrap configuration from file
    ///
    /// # Errors
    /// - File not found
    /// - Invalid YAML/TOML syntax
    /// - Invalid values
    pub fn from_file(path: &str) -> Result<Self, BootstrapError> {
        let expanded_path = shellexpand::tilde(path);
        let path = PathBuf::from(expanded_path.as_ref());

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BootstrapError::FileRead(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| BootstrapError::ParseError(format!("TOML parse error: {}", e)))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| BootstrapError::ParseError(format!("YAML parse error: {}", e)))?
        };

        Self::validate(&config)?;

        Ok(config)
    }

    fn validate(config: &BootstrapConfig) -> Result<(), BootstrapError> {
        let context_path = &config.platform_context_path;
        if !context_path.is_empty() && !context_path.starts_with('/') {
            return Err(BootstrapError::ValidationError(format!(
                "platform_context_path must be empty or start with '/', got '{}'",
                context_path
            )));
        }

        if config.env_prefix.as_deref() == Some("") {
            return Err(BootstrapError::ValidationError(
                "env_prefix must not be empty; omit it to disable environment overrides"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Build the layered settings source
    ///
    /// Precedence: environment, then `extra_files` (from the command line),
    /// then the bootstrap's own files. `~` in file paths is expanded by
    /// `FileConfigSource`.
    pub fn build_source(
        &self,
        extra_files: &[PathBuf],
    ) -> Result<LayeredConfigSource, BootstrapError> {
        let mut source = LayeredConfigSource::new();

        if let Some(prefix) = &self.env_prefix {
            source = source.with_layer(Arc::new(EnvConfigSource::new(prefix.clone())));
        }

        for path in extra_files.iter().chain(self.config_files.iter()) {
            let file = FileConfigSource::new(path.clone())
                .map_err(|e| BootstrapError::ConfigSource(e.to_string()))?;
            source = source.with_layer(Arc::new(file));
        }

        Ok(source)
    }
}

/// Bootstrap configuration errors
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to read bootstrap config: {0}")]
    FileRead(String),

    #[error("Failed to parse bootstrap config: {0}")]
    ParseError(String),

    #[error("Invalid bootstrap config: {0}")]
    ValidationError(String),

    #[error("Failed to open settings source: {0}")]
    ConfigSource(String),
}
