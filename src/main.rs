use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use nasa_mcp_catalog::CatalogClient;
use nasa_mcp_server::config::ServerConfig;
use nasa_mcp_session::{RegistryConfig, SessionRegistry};

/// MCP server exposing the NASA image catalog over streamable HTTP.
#[derive(Parser, Debug)]
#[command(name = "nasa-mcp", version, about)]
struct Cli {
    /// Host to bind
    #[arg(long, env = "NASA_MCP_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 auto-assigns)
    #[arg(long, env = "NASA_MCP_PORT", default_value_t = 3000)]
    port: u16,

    /// Evict sessions idle for this many seconds
    #[arg(long, env = "NASA_MCP_IDLE_TIMEOUT", default_value_t = 1800)]
    idle_timeout_secs: u64,

    /// Upstream NASA Images API base URL
    #[arg(long, env = "NASA_MCP_CATALOG_URL", default_value = nasa_mcp_catalog::DEFAULT_BASE_URL)]
    catalog_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        idle_timeout_secs: cli.idle_timeout_secs,
        catalog_base_url: cli.catalog_url,
        ..Default::default()
    };

    let registry = Arc::new(SessionRegistry::new(RegistryConfig {
        idle_timeout: std::time::Duration::from_secs(config.idle_timeout_secs),
        event_log_capacity: config.event_log_capacity,
    }));
    let catalog =
        CatalogClient::new(&config.catalog_base_url).context("failed to build catalog client")?;

    let handle = nasa_mcp_server::server::start(&config, registry, catalog)
        .await
        .context("failed to start server")?;

    tracing::info!(port = handle.port, "NASA Images MCP server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}
