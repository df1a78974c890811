//! # StudOpt — class-schedule and assignment reminder bot
//!
//! Boots the store, the Zalo channel, the cron scheduler with its two daily
//! jobs, and the HTTP gateway, then runs until Ctrl-C.
//!
//! Usage:
//!   studopt                              # ~/.studopt/config.toml
//!   studopt --config ./studopt.toml     # explicit config file
//!   studopt --verbose

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use studopt_bot::{DispatchEngine, ReminderRunner};
use studopt_channels::zalo::ZaloChannel;
use studopt_channels::DispatchSink;
use studopt_core::config::StudoptConfig;
use studopt_gateway::AppState;
use studopt_scheduler::Scheduler;
use studopt_store::Store;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studopt", version, about = "📚 StudOpt — schedule and assignment reminder bot")]
struct Cli {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "studopt=debug,tower_http=debug"
    } else {
        "studopt=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => StudoptConfig::load_from(path)?,
        None => StudoptConfig::load()?,
    };

    let store = Arc::new(Store::open(config.db_path())?);
    store.seed_config_defaults()?;
    tracing::info!("💾 Store opened at {}", config.db_path().display());

    let channel = Arc::new(ZaloChannel::new(config.bot.clone()));
    if !config.bot.webhook_url.is_empty() {
        if let Err(e) = channel.delete_webhook().await {
            tracing::warn!("⚠️ Could not clear old webhook: {e}");
        }
        channel
            .set_webhook(&config.bot.webhook_url, &config.bot.webhook_secret)
            .await?;
    } else {
        tracing::warn!("⚠️ No webhook_url configured, skipping webhook registration");
    }
    let sink: Arc<dyn DispatchSink> = channel;

    let scheduler = Arc::new(Scheduler::new(config.tz(), config.snapshot_path()));
    let runner = Arc::new(ReminderRunner::new(
        store.clone(),
        &config,
        sink.clone(),
        scheduler.clone(),
    ));

    let digest_runner = runner.clone();
    scheduler.add_job_fn(
        "daily-notification",
        &config.schedule.daily_digest_cron,
        move || {
            let runner = digest_runner.clone();
            async move { runner.run_daily_digest().await }
        },
    )?;
    let due_runner = runner.clone();
    scheduler.add_job_fn(
        "daily-reminder-assignment-due",
        &config.schedule.assignment_due_cron,
        move || {
            let runner = due_runner.clone();
            async move { runner.run_due_reminders().await }
        },
    )?;
    scheduler.restore_all_jobs()?;

    let state = AppState {
        store: store.clone(),
        dispatch: Arc::new(DispatchEngine::new(store, &config)),
        sink,
        tz: config.tz(),
        webhook_secret: config.bot.webhook_secret.clone(),
        admin_secret: config.gateway.admin_secret.clone(),
    };

    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    tokio::select! {
        result = studopt_gateway::start(&host, port, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("🛑 Shutting down");
            scheduler.save_state()?;
            scheduler.destroy_all()?;
        }
    }
    Ok(())
}
