//! Configuration schema for the Forge dashboard

use crate::poll::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForgeConfig {
    /// Backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Poll cadence for the detail view
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Terminal dashboard preferences
    #[serde(default)]
    pub ui: UiConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend origin; screenshots are resolved against it
    pub base_url: String,

    /// Path of the REST API under the origin
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Request timeout in seconds (unset = transport default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_path() -> String {
    "/api/v1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_path: default_api_path(),
            timeout_secs: None,
        }
    }
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between two polls of an active resource, in milliseconds
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(self.interval_ms.max(1)))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Log format: "compact", "pretty", "json"
    pub format: String,

    /// Log file used while the terminal dashboard owns the screen
    /// (relative to ~/.forge or absolute)
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_file() -> String {
    "forge.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            file: default_log_file(),
        }
    }
}

/// Right-hand panel of the detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailPanel {
    #[default]
    Screenshots,
    Logs,
}

impl DetailPanel {
    pub fn toggled(self) -> Self {
        match self {
            Self::Screenshots => Self::Logs,
            Self::Logs => Self::Screenshots,
        }
    }
}

/// Terminal dashboard preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Panel shown next to the live cells when a task opens
    #[serde(default)]
    pub detail_panel: DetailPanel,

    /// Open full-size screenshots in the system browser
    #[serde(default = "default_open_in_browser")]
    pub open_in_browser: bool,
}

fn default_open_in_browser() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            detail_panel: DetailPanel::default(),
            open_in_browser: default_open_in_browser(),
        }
    }
}

impl ForgeConfig {
    /// Resolve environment variables in configuration values
    ///
    /// Supports ${VAR_NAME} syntax in string fields
    pub fn resolve_env_vars(&mut self) {
        self.backend.base_url = Self::expand_env_var(&self.backend.base_url);
        self.backend.api_path = Self::expand_env_var(&self.backend.api_path);
        self.logging.file = Self::expand_env_var(&self.logging.file);
    }

    /// Expand environment variable in a string
    ///
    /// Supports ${VAR_NAME} syntax
    fn expand_env_var(value: &str) -> String {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            std::env::var(var_name).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }

    /// Get the resolved log file path
    ///
    /// If path is relative, resolves it relative to ~/.forge
    pub fn log_file_path(&self) -> Option<PathBuf> {
        let path = PathBuf::from(&self.logging.file);
        if path.is_absolute() {
            Some(path)
        } else {
            crate::init::get_forge_home().ok().map(|home| home.join(path))
        }
    }
}
