//! Configuration loader with dual-location support
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: ~/.forge/forge.toml
//! 3. Project-level config: ./.forge/forge.toml
//!
//! Later files override earlier ones key by key; keys a file does not
//! mention keep the value from the layer below.

use crate::config::schema::ForgeConfig;
use crate::error::{ForgeError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use toml::Value;
use tracing::{debug, info};

/// Configuration loader that handles both user and project configs
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the standard locations
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ForgeError::Config("Could not determine home directory".to_string()))?;
        let cwd = std::env::current_dir()?;
        Ok(Self::with_paths(
            home.join(".forge").join("forge.toml"),
            cwd.join(".forge").join("forge.toml"),
        ))
    }

    /// Create a loader for explicit file locations
    pub fn with_paths(user_config_path: impl Into<PathBuf>, project_config_path: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: user_config_path.into(),
            project_config_path: project_config_path.into(),
        }
    }

    /// Load configuration from both locations with project taking precedence
    pub async fn load(&self) -> Result<ForgeConfig> {
        let mut merged = Value::Table(Default::default());
        debug!("Loading configuration with defaults");

        for (label, path) in [("user", &self.user_config_path), ("project", &self.project_config_path)] {
            match Self::read_layer(path).await? {
                Some(layer) => {
                    debug!(path = %path.display(), "Loaded {}-level config", label);
                    merge_values(&mut merged, layer);
                }
                None => {
                    debug!(path = %path.display(), "{}-level config not found", label);
                }
            }
        }

        let mut config: ForgeConfig = merged
            .try_into()
            .map_err(|e| ForgeError::Config(format!("Invalid configuration: {}", e)))?;
        config.resolve_env_vars();

        info!(backend = %config.backend.base_url, "Configuration loaded");
        Ok(config)
    }

    /// Load a single file, without layering
    pub async fn load_file(path: &Path) -> Result<ForgeConfig> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ForgeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Missing file is `None`; unreadable or malformed file is an error
    async fn read_layer(path: &Path) -> Result<Option<Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ForgeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let value: Value = toml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Some(value))
    }

    /// Get user config path
    pub fn user_config_path(&self) -> &Path {
        &self.user_config_path
    }

    /// Get project config path
    pub fn project_config_path(&self) -> &Path {
        &self.project_config_path
    }

    /// Check if user config exists
    pub fn user_config_exists(&self) -> bool {
        self.user_config_path.exists()
    }

    /// Check if project config exists
    pub fn project_config_exists(&self) -> bool {
        self.project_config_path.exists()
    }
}

/// Where the effective configuration comes from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A single file given with `--config`; the layered files are skipped
    Explicit(PathBuf),
    Layered(ConfigLoader),
}

impl ConfigSource {
    /// An explicit file wins; otherwise the standard user/project layers
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path.to_path_buf())),
            None => Ok(Self::Layered(ConfigLoader::new()?)),
        }
    }

    pub async fn load(&self) -> Result<ForgeConfig> {
        match self {
            Self::Explicit(path) => {
                let mut config = ConfigLoader::load_file(path).await?;
                config.resolve_env_vars();
                info!(path = %path.display(), "Configuration loaded from explicit file");
                Ok(config)
            }
            Self::Layered(loader) => loader.load().await,
        }
    }

    /// Label, path and presence of each file this source reads
    pub fn files(&self) -> Vec<(&'static str, &Path, bool)> {
        match self {
            Self::Explicit(path) => vec![("Explicit", path.as_path(), path.exists())],
            Self::Layered(loader) => vec![
                ("User", loader.user_config_path(), loader.user_config_exists()),
                ("Project", loader.project_config_path(), loader.project_config_exists()),
            ],
        }
    }
}

/// Recursive table merge; non-table values in `overlay` replace `base`
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
