//! camgate binary
//!
//! Reads configuration from the environment (and `.env`), then serves until
//! Ctrl-C.

use anyhow::Context;
use camgate::{GatewayServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting camgate v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let server = GatewayServer::from_config(config).context("failed to initialise gateway")?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}
