//! CLI configuration
//!
//! Loaded from `~/.config/native-keychain/config.toml` unless `--config`
//! points elsewhere. Every field is optional.

use std::path::{Path, PathBuf};

use anyhow::Context;
use native_keychain::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

/// native-keychain CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Service used when `--service` is not given (none: omit the service)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_service: Option<String>,

    /// Namespace the OS keychain backend uses for items without a service
    pub backend_namespace: String,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_service: None,
            backend_namespace: DEFAULT_NAMESPACE.to_string(),
            log_level: None,
        }
    }
}

impl CliConfig {
    /// Get the default config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("native-keychain")
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `explicit` if given (it must exist), else the default file if present
    pub fn load_or_default(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Err(errors) = config.validate() {
            anyhow::bail!("Invalid configuration: {}", errors.join("; "));
        }

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.backend_namespace.trim().is_empty() {
            errors.push("backend_namespace must not be empty".to_string());
        }

        if self
            .default_service
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            errors.push("default_service must not be empty when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Service for a request: the explicit one, else the configured default
    pub fn service_for(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.default_service.clone())
    }
}
