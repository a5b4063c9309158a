mod actions;
mod bootstrap;
mod check;
mod health;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use brewbot_core::config::{AppConfig, LoadOptions};
use brewbot_core::orders::spawn_eviction;
use clap::Parser;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(
    name = "brewbot-server",
    about = "Slack coffee ordering bot",
    long_about = "Listens for `@brewbot order` mentions over Socket Mode and serves the \
                  interactive callback endpoint for the order dialog.",
    after_help = "Examples:\n  brewbot-server\n  brewbot-server --config brewbot.toml --check"
)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Fail when the configuration file is missing")]
    require_config: bool,
    #[arg(long, help = "Validate configuration, print a redacted summary and exit")]
    check: bool,
}

fn init_logging(config: &AppConfig) {
    use brewbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(LoadOptions {
        config_path: cli.config,
        require_file: cli.require_config,
        ..LoadOptions::default()
    })?;

    if cli.check {
        println!("{}", check::render_summary(&config));
        return Ok(());
    }

    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let context = app.context.clone();
    let order = &context.config.order;

    let sweeper =
        spawn_eviction(context.store.clone(), order.pending_ttl(), order.sweep_interval());

    tracing::info!(
        event_name = "system.server.slack_transport_mode",
        transport_mode = app.transport_mode,
        correlation_id = "bootstrap",
        "slack runner transport mode initialized"
    );
    let runner = app.slack_runner;
    let listener = tokio::spawn(async move {
        if let Err(error) = runner.start().await {
            tracing::error!(
                event_name = "system.server.listener_stopped",
                error = %error,
                "mention listener stopped"
            );
        }
    });

    let address = format!("{}:{}", context.config.server.bind_address, context.config.server.port);
    let tcp = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;
    let router = actions::router(context.interactions.clone())
        .merge(health::router(context.store.clone()));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(tcp, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "brewbot-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "brewbot-server stopping"
    );

    let _ = shutdown_tx.send(true);
    let grace = Duration::from_secs(context.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(error))) => tracing::warn!(error = %error, "http server exited with error"),
        Ok(Err(error)) => tracing::warn!(error = %error, "http server task failed"),
        Err(_) => tracing::warn!(
            grace_secs = grace.as_secs(),
            "in-flight requests did not finish before shutdown deadline"
        ),
    }

    listener.abort();
    sweeper.abort();
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
