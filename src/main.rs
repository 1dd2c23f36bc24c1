use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use metrics_exporter_prometheus::PrometheusBuilder;

use tracing::info;

use relay::{AppConfig, Logger, RelayApplicationServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are kept alive to flush logs and keep the sentry client around
    let _guards = Logger::init(&config);

    info!(
        "logger and env prepped (mode: {}, origin timeout: {}s)...",
        config.download_mode.as_str(),
        config.origin_timeout_secs
    );

    if config.allowed_hosts.is_empty() {
        info!("no allowed hosts configured, relay will fetch from any origin");
    }

    let metrics = if config.enable_metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install prometheus recorder")?;
        info!("prometheus recorder installed, serving /metrics");
        Some(handle)
    } else {
        None
    };

    RelayApplicationServer::serve(config, metrics)
        .await
        .context("relay server failed to start")?;

    Ok(())
}
