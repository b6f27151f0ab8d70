//! Backend health command

use crate::api::HttpTaskClient;
use crate::error::{ForgeError, Result};
use colored::Colorize;
use std::time::Instant;
use tracing::warn;

/// Handle `forge status`
pub async fn handle_status(client: &HttpTaskClient, format: &str) -> Result<()> {
    let started = Instant::now();
    let outcome = client.health().await;
    let elapsed_ms = started.elapsed().as_millis();

    if format == "json" {
        let report = match &outcome {
            Ok(health) => serde_json::json!({
                "backend": client.origin().as_str(),
                "status": health.status,
                "response_time_ms": elapsed_ms,
            }),
            Err(e) => serde_json::json!({
                "backend": client.origin().as_str(),
                "status": "unreachable",
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Backend: {}", client.origin());
        match &outcome {
            Ok(health) if health.is_ok() => {
                println!("Status: {} ({}ms)", "✓ Healthy".green(), elapsed_ms);
            }
            Ok(health) => {
                println!("Status: {} ({}ms)", format!("⚠ {}", health.status).yellow(), elapsed_ms);
            }
            Err(e) => {
                println!("Status: {}", "✗ Unreachable".red());
                println!("  {}", e);
            }
        }
    }

    match outcome {
        Ok(health) if health.is_ok() => Ok(()),
        Ok(health) => {
            warn!(status = %health.status, "Backend reports degraded health");
            Err(ForgeError::Other(format!("Backend status: {}", health.status)))
        }
        Err(e) => Err(e),
    }
}
