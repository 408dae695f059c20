use anyhow::{Context as _, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use taskd::config::Config;
use taskd::store::TaskStore;
use taskd::{rest, AppContext};

#[derive(Parser)]
#[command(name = "taskd", about = "taskd — task tracker REST API", version)]
struct Args {
    /// HTTP listening port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Log output format: "pretty" (human-readable) or "json" (structured)
    #[arg(long, env = "TASKD_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(Config::new(args.port, args.log, args.log_format));

    setup_logging(&config.log, &config.log_format);

    info!(
        environment = %config.environment,
        port = config.port,
        "starting taskd v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Strict startup chain: without a reachable database and the tasks table
    // in place, every request would fail. Refuse to serve instead.
    let store = Arc::new(
        TaskStore::connect(&config.database)
            .await
            .context("database is unreachable, refusing to start")?,
    );
    store
        .ensure_schema()
        .await
        .context("schema bootstrap failed, refusing to start")?;
    info!("tasks table ready");

    let ctx = Arc::new(AppContext {
        config: config.clone(),
        store: store.clone(),
        started_at: std::time::Instant::now(),
    });

    rest::serve(ctx).await?;

    // In-flight requests have drained; release pooled connections.
    store.close().await;
    info!("shutdown complete");
    Ok(())
}

fn setup_logging(log_level: &str, log_format: &str) {
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}
