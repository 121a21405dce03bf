//! OKX Signals Strategy Main Entry Point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use okx_signals::{
    resolve_config_path, run_session, SessionEnd, StrategyConfig, StreamDispatcher,
    WebSocketTransport,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "okx_signals", about = "OKX market data signals with stage latency breakdown")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint override
    #[arg(long)]
    url: Option<String>,

    /// Comma-separated instruments, e.g. BTC-USDT,ETH-USDT
    #[arg(long)]
    symbols: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!("🚀 Starting OKX Signals Strategy");

    let config = load_config(&cli).context("Failed to load OKX strategy configuration")?;

    info!(
        "Configuration loaded: {} subscriptions on {}",
        config.subscriptions.len(),
        config.ws_url
    );

    let mut dispatcher =
        StreamDispatcher::new(&config).context("Failed to build stream dispatcher")?;

    let mut transport = WebSocketTransport::connect(&config.ws_url, config.connect_timeout())
        .await
        .context("WebSocket connection failed")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let end = run_session(
        &mut transport,
        &mut dispatcher,
        config.report_interval(),
        shutdown,
    )
    .await
    .context("OKX session failed")?;

    dispatcher.log_latency_summary();
    match end {
        SessionEnd::Shutdown => info!("OKX Signals Strategy stopped"),
        SessionEnd::Disconnected => info!("OKX Signals Strategy stopped after remote disconnect"),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<StrategyConfig> {
    let path = resolve_config_path(cli.config.clone());
    let mut config = StrategyConfig::from_toml_with_env_overrides(&path)?;

    if let Some(url) = &cli.url {
        config.ws_url = url.clone();
    }
    if let Some(symbols) = &cli.symbols {
        config.set_symbols(symbols);
    }

    config.validate()?;
    Ok(config)
}
