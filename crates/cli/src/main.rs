mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use infergate_api::{ManagementApi, ManagementClient, build_http_client};
use infergate_engine::InferenceService;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigOverrides, GatewayConfig};
use crate::server::InferHttpServer;

/// Resolve dataspace credentials and proxy inference calls.
#[derive(Debug, Parser)]
#[command(name = "infergate", version, about)]
struct Cli {
    /// YAML or JSON configuration file
    #[arg(long, env = "INFERGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "infergate_engine=debug"; RUST_LOG is used when absent
    #[arg(long, env = "INFERGATE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = GatewayConfig::load(cli.config.as_deref())?.with_overrides(&cli.overrides);
    config.validate().context("invalid configuration")?;

    let http = build_http_client(config.http_timeouts())?;
    let management = ManagementClient::new(&config.management_url, http.clone(), config.management_api_key.clone())?;
    let service = Arc::new(InferenceService::new(
        Arc::new(management) as Arc<dyn ManagementApi>,
        http,
        config.engine_settings(),
    ));

    let server = InferHttpServer::new(config.socket_address()?, config.infer_route(), service)
        .start()
        .await
        .context("start infer HTTP server")?;
    info!(
        address = %server.bound_address(),
        route = %server.route(),
        management_url = %config.management_url,
        "infergate listening"
    );

    tokio::signal::ctrl_c().await.context("wait for shutdown signal")?;
    info!("shutting down");
    server.stop().await
}

fn init_tracing(log_level: Option<&str>) {
    let filter = log_level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".into());
    let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
