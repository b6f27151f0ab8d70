//! Tracing subscriber setup
//!
//! CLI commands log to stderr. The terminal dashboard owns the screen, so
//! it logs to a file instead.

use crate::config::LoggingConfig;
use crate::error::{ForgeError, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Level directive from `-v` count, falling back to the configured level
pub fn level_for(config: &LoggingConfig, verbose: u8) -> String {
    match verbose {
        0 => config.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// `RUST_LOG` wins over the computed level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig, verbose: u8, target: LogTarget) -> Result<()> {
    let filter = env_filter(&level_for(config, verbose));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match target {
        LogTarget::Stderr => match config.format.as_str() {
            "json" => builder.json().with_writer(std::io::stderr).try_init(),
            "pretty" => builder.pretty().with_writer(std::io::stderr).try_init(),
            _ => builder.compact().with_writer(std::io::stderr).try_init(),
        },
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let writer = Mutex::new(file);
            match config.format.as_str() {
                "json" => builder.json().with_ansi(false).with_writer(writer).try_init(),
                "pretty" => builder.pretty().with_ansi(false).with_writer(writer).try_init(),
                _ => builder.compact().with_ansi(false).with_writer(writer).try_init(),
            }
        }
    };

    result.map_err(|e| ForgeError::Other(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        let config = LoggingConfig::default();
        assert_eq!(level_for(&config, 0), "info");
        assert_eq!(level_for(&config, 1), "debug");
        assert_eq!(level_for(&config, 4), "trace");
    }

    #[test]
    fn test_configured_level_used_without_flags() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(level_for(&config, 0), "warn");
    }
}
