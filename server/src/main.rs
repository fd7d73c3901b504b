// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VIGIL server binary: builds the engine services once and serves the
//! HTTP + SSE surface.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_server::state::{AppState, StateOptions};

/// VIGIL workflow observation server
#[derive(Parser)]
#[command(name = "vigil-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP bind host
    #[arg(long, env = "VIGIL_HOST", default_value = "127.0.0.1")]
    host: String,

    /// HTTP bind port
    #[arg(long, env = "VIGIL_PORT", default_value = "8000")]
    port: u16,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, env = "VIGIL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Override the pattern confidence threshold
    #[arg(long, env = "VIGIL_CONFIDENCE_THRESHOLD")]
    confidence_threshold: Option<f64>,

    /// Remote embedding service endpoint; deterministic fallback when unset
    #[arg(long, env = "VIGIL_EMBEDDING_URL")]
    embedding_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut options = StateOptions {
        embedding_url: cli.embedding_url.clone(),
        ..StateOptions::default()
    };
    if let Some(threshold) = cli.confidence_threshold {
        options.pattern = options.pattern.with_confidence_threshold(threshold);
    }

    let state = AppState::build(options);
    let app = vigil_server::routes::app(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "vigil server listening");

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
