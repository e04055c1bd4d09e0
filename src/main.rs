// ABOUTME: Main entry point for slagobot
// ABOUTME: Loads config, gathers host identity, connects to Slack, and runs the dispatch loop

use anyhow::{Context, Result};
use clap::Parser;
use slagobot::{config::Config, host, logging, platform::SlackTransport};
use slagobot_core::{
    config::DEFAULT_CHANNEL_NAME, CommandRouter, DirectoryCache, Dispatcher, RealtimeTransport,
    StopReason,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "slagobot", version, about = "Always-on Slack agent")]
struct Cli {
    /// Path to the config file
    #[arg(long, env = "SLAGOBOT_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Slack bot token (overrides config and SLACK_TOKEN)
    #[arg(long)]
    slack_token: Option<String>,
}

fn install_metrics_exporter(listen: &str) -> Result<()> {
    let addr: std::net::SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid metrics listen address: {}", listen))?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to log panics before they crash the process
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC! slagobot crashed: {}", panic_info);
        eprintln!("{:?}", std::backtrace::Backtrace::force_capture());
    }));

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing();

    tracing::info!("Starting slagobot");

    let mut config = Config::load(cli.config_path.as_deref())?;
    if let Some(token) = cli.slack_token {
        config.slack.bot_token = token;
    }
    config.validate()?;

    tracing::info!(
        admin = %config.bot.admin,
        admins = ?config.bot.admins,
        channel = %config.bot.default_channel_name(),
        heartbeat_secs = config.slack.heartbeat_secs,
        "Configuration loaded"
    );

    if let Some(listen) = config.metrics.listen.as_deref() {
        install_metrics_exporter(listen)?;
    }

    let host_identity = host::gather().await;
    tracing::info!(
        outbound_ip = %host_identity.outbound_ip,
        external_ip = %host_identity.external_ip,
        hostname = %host_identity.hostname,
        platform = %host_identity.platform,
        "Host identity resolved"
    );

    let transport = Arc::new(SlackTransport::new(&config.slack).await?);

    let (directory, directory_errors) = DirectoryCache::build(
        transport.channel_snapshot().await,
        transport.user_snapshot().await,
    );
    if !directory_errors.is_empty() {
        tracing::warn!(
            failures = directory_errors.len(),
            "Continuing with a partial directory"
        );
    }

    let default_channel_id =
        directory.resolve_default_channel(config.bot.default_channel_name(), DEFAULT_CHANNEL_NAME);
    let auth = config.bot.authorization(default_channel_id);
    if auth.has_destination() {
        tracing::info!(channel_id = %auth.default_channel_id, "Default channel resolved");
    } else {
        tracing::warn!(
            channel = %config.bot.default_channel_name(),
            "Default channel not found; replies outside typing nudges are disabled"
        );
    }

    let router = CommandRouter::new(auth, host_identity);
    let mut dispatcher = Dispatcher::new(Arc::clone(&transport), directory, router);

    let mut events = transport.event_stream().await?;
    let summary = dispatcher.run(&mut events).await;

    transport.shutdown().await?;

    match summary.reason {
        StopReason::StreamEnded => {
            tracing::info!(events = summary.events_processed, "slagobot stopped");
            Ok(())
        }
        StopReason::InvalidAuth => {
            anyhow::bail!("Slack rejected the credentials; check the bot and app tokens")
        }
    }
}
