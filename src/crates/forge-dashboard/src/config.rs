//! Configuration management for the Forge dashboard
//!
//! Supports dual-location configuration:
//! - User-level: ~/.forge/forge.toml
//! - Project-level: ./.forge/forge.toml
//!
//! Project-level config overrides user-level config.

mod loader;
mod schema;

pub use loader::{ConfigLoader, ConfigSource};
pub use schema::{BackendConfig, DetailPanel, ForgeConfig, LoggingConfig, PollingConfig, UiConfig};

use crate::Result;

/// Load configuration from both locations with project config taking precedence
///
/// Priority order:
/// 1. Default values
/// 2. User-level config (~/.forge/forge.toml)
/// 3. Project-level config (./.forge/forge.toml)
pub async fn load_config() -> Result<ForgeConfig> {
    let loader = ConfigLoader::new()?;
    loader.load().await
}
