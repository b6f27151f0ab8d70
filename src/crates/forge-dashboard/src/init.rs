//! First-time setup for the Forge dashboard
//!
//! Creates the configuration directory and writes a commented default
//! `forge.toml`, either user-level (~/.forge) or project-level (./.forge).

use crate::error::{ForgeError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration directory name
pub const CONFIG_DIR: &str = ".forge";

/// Default configuration file name
pub const CONFIG_FILE: &str = "forge.toml";

/// Get the Forge home directory (~/.forge)
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined
pub fn get_forge_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or_else(|| ForgeError::Config("Could not determine home directory".to_string()))
}

/// Get the path to the user-level configuration file
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_forge_home()?.join(CONFIG_FILE))
}

/// Get the path to the project-level configuration file
pub fn get_project_config_path() -> PathBuf {
    PathBuf::from(".").join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Write a default configuration file
///
/// * `project` - write ./.forge/forge.toml instead of ~/.forge/forge.toml
/// * `force` - overwrite an existing file
///
/// Returns the path of the configuration file.
pub fn initialize(project: bool, force: bool) -> Result<PathBuf> {
    let config_path = if project {
        get_project_config_path()
    } else {
        get_user_config_path()?
    };
    write_config_at(&config_path, force)?;
    Ok(config_path)
}

/// Create the parent directory and the default file at `config_path`
pub fn write_config_at(config_path: &Path, force: bool) -> Result<()> {
    if let Some(dir) = config_path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| ForgeError::Config(format!("Failed to create directory: {}", e)))?;
            info!(path = %dir.display(), "Created configuration directory");
        }
    }

    if config_path.exists() && !force {
        warn!(path = %config_path.display(), "Configuration already exists (use --force to overwrite)");
        return Err(ForgeError::Config(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    create_default_config(config_path)?;
    info!(path = %config_path.display(), "Created default configuration");
    Ok(())
}

/// Commented default configuration, matching `ForgeConfig::default()`
pub const DEFAULT_CONFIG: &str = r#"# Forge Configuration
#
# User-level settings live in ~/.forge/forge.toml.
# Project-specific settings can be placed in ./.forge/forge.toml
# and override the user file key by key.

[backend]
# Backend origin; also the origin screenshots are served from
# Can use environment variables like ${FORGE_BACKEND_URL}
base_url = "http://localhost:8000"

# REST API path under the origin
api_path = "/api/v1"

# Request timeout in seconds (omit for no timeout)
# timeout_secs = 30

[polling]
# Delay between polls of a running task, in milliseconds
interval_ms = 1000

[logging]
# Log level: "trace", "debug", "info", "warn", "error"
level = "info"

# Log format: "compact", "pretty", "json"
format = "compact"

# Log file used by the terminal dashboard (relative to ~/.forge)
file = "forge.log"

[ui]
# Panel next to the live cells: "screenshots" or "logs"
detail_panel = "screenshots"

# Open full-size screenshots in the system browser
open_in_browser = true
"#;

/// Create default configuration file
fn create_default_config(path: &Path) -> Result<()> {
    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| ForgeError::Config(format!("Failed to write configuration: {}", e)))?;
    Ok(())
}
