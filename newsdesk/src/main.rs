/*
newsdesk - single-binary main.rs
This binary opens the article store and runs the periodic ingestion worker inside the same process.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio::sync::Notify;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsdesk::storage::{ArticleStore, Backing, StoreOptions};
use newsdesk::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Newsdesk feed ingestion worker and article store")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single ingestion cycle, print stats and exit
    #[arg(long)]
    once: bool,

    /// Add the demonstration articles to the store before starting
    #[arg(long)]
    seed_sample: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default_path = ?default_path, override_path = ?override_path, sources = config.sources.len(), "configuration loaded");

    // Open the store and wire the orchestrator in as its refresher
    let backing = Backing::from_config(&config.store);
    let store = ArticleStore::open(backing, StoreOptions::from_config(&config.store))
        .await
        .context("failed to open article store")?;
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    info!(sources = orchestrator.sources().len(), "orchestrator ready");
    let store = Arc::new(store.with_refresher(orchestrator));

    if args.seed_sample {
        let seeded = store.seed_sample().await.context("failed to seed sample articles")?;
        info!(count = seeded.len(), "sample articles seeded");
    }

    if args.once {
        let new_articles = store.refresh().await?;
        let stats = store.get_stats().await;
        info!(new_articles, "single cycle finished");
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if let Err(e) = store.initialize().await {
        warn!(%e, "initial ingestion failed; serving stored data");
    }

    let shutdown_notify = Arc::new(Notify::new());
    let interval = worker_interval(config.scheduler.interval_minutes);

    info!("Spawning background worker task");
    let w_store = store.clone();
    let w_shutdown = shutdown_notify.clone();
    let worker_handle = tokio::spawn(async move { run_worker(w_store, interval, w_shutdown).await });

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("ctrl-c received, notifying worker to shutdown");
    shutdown_notify.notify_one();

    // In-flight fetches are bounded by the fetch timeout.
    match tokio::time::timeout(Duration::from_secs(20), worker_handle).await {
        Ok(Ok(())) => info!("worker exited cleanly"),
        Ok(Err(join_err)) => error!(%join_err, "worker task panicked"),
        Err(_) => info!("Timed out waiting for worker to exit; continuing shutdown"),
    }

    if let Err(e) = store.flush().await {
        error!(%e, "failed to flush article store");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Scheduler period; at least one minute, saturating on absurd values.
fn worker_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.max(1).saturating_mul(60))
}

/// Periodic ingestion loop. Runs until `shutdown_notify` is signalled.
/// Cycles go through the store's refresh gate, so they never overlap with a
/// refresh triggered by a stale read.
async fn run_worker(store: Arc<ArticleStore>, interval: Duration, shutdown_notify: Arc<Notify>) {
    info!(interval_secs = interval.as_secs(), "worker: scheduler started");

    loop {
        select! {
            _ = tokio::time::sleep(interval) => {
                match store.refresh().await {
                    Ok(new_articles) => info!(new_articles, "worker: scheduled cycle complete"),
                    Err(e) => error!(%e, "worker: scheduled cycle failed"),
                }
            },
            _ = shutdown_notify.notified() => {
                info!("worker: shutdown requested, exiting loop");
                break;
            }
        }
    }

    info!("worker: cleanup complete");
}
