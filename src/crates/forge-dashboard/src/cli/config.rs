//! Configuration command handlers

use crate::config::{ConfigSource, ForgeConfig};
use crate::error::{ForgeError, Result};
use crate::init;
use colored::Colorize;

/// Handle `forge config init`
pub fn handle_init(project: bool, force: bool) -> Result<()> {
    let path = init::initialize(project, force)?;
    println!("{}", "✓ Configuration written".green().bold());
    println!("  Path: {}", path.display());
    println!("\nEdit [backend] base_url to point at your backend.");
    Ok(())
}

/// Handle `forge config show`
///
/// Prints the effective configuration (after layering and overrides) and
/// which files contributed to it.
pub fn handle_show(config: &ForgeConfig, source: &ConfigSource) -> Result<()> {
    for (label, path, exists) in source.files() {
        let state = if exists { "loaded".green() } else { "not found".dimmed() };
        println!("{} config: {} ({})", label, path.display(), state);
    }
    println!();

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ForgeError::Config(format!("Failed to render configuration: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
