use anyhow::{anyhow, Result};
use api::ApiConfig;
use colored::*;
use tracing::info;

/// Run the HTTP API until interrupted
pub async fn execute(config: ApiConfig) -> Result<()> {
    println!(
        "{} on port {}",
        "Starting campus access API".bold(),
        config.port.to_string().cyan()
    );
    info!(
        "Policy: {}, accounts: {}",
        config
            .policy_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string()),
        config
            .accounts_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    api::start_server_with_config(config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))
}
