//! SwishView tracker — background reconciliation service for YouTube
//! view-growth campaigns.
//!
//! Main entry point that wires the campaign store, view-count fetcher,
//! and tracker supervisor together.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;

use swishview_core::config::AppConfig;
use swishview_core::notify::LogSink;
use swishview_store::{CampaignStore, MemoryStore, RestStore};
use swishview_tracker::{Reconciler, TrackerSupervisor};
use swishview_youtube::YouTubeFetcher;

#[derive(Parser, Debug)]
#[command(name = "swishview")]
#[command(about = "Background view-count tracker for SwishView campaigns")]
#[command(version)]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, env = "SWISHVIEW__TRACKER__POLL_INTERVAL_SECS")]
    poll_interval_secs: Option<u64>,

    /// Maximum simultaneous view-count fetches (overrides config)
    #[arg(long, env = "SWISHVIEW__TRACKER__MAX_CONCURRENT_FETCHES")]
    max_concurrent_fetches: Option<usize>,

    /// YouTube Data API key (overrides config)
    #[arg(long, env = "SWISHVIEW__YOUTUBE__API_KEY")]
    youtube_api_key: Option<String>,

    /// Campaign store backend
    #[arg(long, value_enum, default_value_t = StoreBackend::Rest)]
    store: StoreBackend,

    /// Run a single reconciliation tick and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreBackend {
    /// In-memory store for local development
    Memory,
    /// Hosted campaign record store
    Rest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swishview=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("SwishView tracker starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(secs) = cli.poll_interval_secs {
        config.tracker.poll_interval_secs = secs;
    }
    if let Some(n) = cli.max_concurrent_fetches {
        config.tracker.max_concurrent_fetches = n;
    }
    if let Some(key) = cli.youtube_api_key {
        config.youtube.api_key = key;
    }

    info!(
        poll_interval_secs = config.tracker.poll_interval_secs,
        max_concurrent_fetches = config.tracker.max_concurrent_fetches,
        failure_threshold = config.tracker.failure_threshold,
        store = ?cli.store,
        "Configuration loaded"
    );

    let store: Arc<dyn CampaignStore> = match cli.store {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Rest => Arc::new(RestStore::new(&config.store)?),
    };
    let fetcher = Arc::new(YouTubeFetcher::new(config.youtube.clone())?);
    let reconciler = Arc::new(Reconciler::new(
        store,
        fetcher,
        Arc::new(LogSink),
        &config.tracker,
    ));

    if cli.once {
        let summary = reconciler.run_tick().await;
        info!(
            active = summary.active_seen,
            updated = summary.updated,
            completed = summary.completed,
            "single reconciliation tick finished"
        );
        return Ok(());
    }

    let supervisor = TrackerSupervisor::new(
        reconciler,
        Duration::from_secs(config.tracker.poll_interval_secs),
    );
    supervisor.start();

    info!("SwishView tracker is running");

    // Block until shutdown
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    supervisor.shutdown();
    supervisor.wait().await;

    Ok(())
}
