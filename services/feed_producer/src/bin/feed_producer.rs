//! Feed Producer Service
//!
//! Polls the configured location store and keeps a GTFS-realtime
//! VehiclePositions feed current on disk and/or over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use feed_producer::{FeedFileWriter, FeedHttpServer, RefreshScheduler, SchedulerOptions};
use producer_config::{LoggingSettings, ProducerConfig};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "feed_producer", version, about = "GTFS-realtime VehiclePositions feed producer")]
struct Args {
    /// Configuration file (defaults to config/feed_producer.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Location store URI, e.g. mongodb://localhost:27017 or file:///var/lib/vehicle-positions
    #[arg(long)]
    store_uri: Option<String>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    collection: Option<String>,

    /// Write the feed to this file after every position cycle
    #[arg(long)]
    locations_path: Option<PathBuf>,

    /// Serve the feed over HTTP on this address
    #[arg(long)]
    locations_bind: Option<String>,

    /// Roster refresh period in seconds
    #[arg(long)]
    roster_interval: Option<u64>,

    /// Position refresh period in seconds
    #[arg(long)]
    position_interval: Option<u64>,

    /// Evict vehicles not heard from within this many milliseconds
    #[arg(long)]
    stale_age_limit_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn apply(self, config: &mut ProducerConfig) {
        if let Some(uri) = self.store_uri {
            config.store.uri = uri;
        }
        if let Some(database) = self.database {
            config.store.database = database;
        }
        if let Some(collection) = self.collection {
            config.store.collection = collection;
        }
        if let Some(path) = self.locations_path {
            config.export.file_path = Some(path);
        }
        if let Some(bind) = self.locations_bind {
            config.export.http_bind = Some(bind);
        }
        if let Some(secs) = self.roster_interval {
            config.refresh.roster_interval_secs = secs;
        }
        if let Some(secs) = self.position_interval {
            config.refresh.position_interval_secs = secs;
        }
        if let Some(limit) = self.stale_age_limit_ms {
            config.refresh.stale_age_limit_ms = Some(limit);
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn init_logging(settings: &LoggingSettings) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .with_context(|| format!("invalid log level {:?}", settings.level))?,
    };

    if settings.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ProducerConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    init_logging(&config.logging)?;

    if let Err(e) = config.validate() {
        error!("Configuration rejected: {}", e);
        return Err(e.into());
    }

    info!("🚀 Starting Feed Producer");

    let store = store_adapters::connect(&config.store).await.map_err(|e| {
        error!("Cannot open location store: {}", e);
        e
    })?;

    let scheduler = RefreshScheduler::new(store, SchedulerOptions::from(&config.refresh));
    let exporters = CancellationToken::new();
    let mut handles = Vec::new();

    if let Some(addr) = config.export.http_bind_addr()? {
        let server = FeedHttpServer::new(addr, scheduler.subscribe(), scheduler.stats());
        let (_, handle) = server.spawn(exporters.clone()).map_err(|e| {
            error!("Cannot start feed endpoint: {}", e);
            e
        })?;
        handles.push(handle);
    }

    if let Some(path) = &config.export.file_path {
        handles.push(FeedFileWriter::new(path).spawn(scheduler.subscribe(), exporters.clone()));
    }

    if handles.is_empty() {
        warn!("No exporter configured; the feed is only kept in memory");
    }

    scheduler.start()?;
    info!(
        collection = %config.store.collection,
        "✅ Feed Producer running. Press Ctrl+C to stop."
    );

    signal::ctrl_c().await?;
    info!("🛑 Shutting down Feed Producer");

    scheduler.stop().await;
    exporters.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Exporter task ended abnormally: {}", e);
        }
    }

    let stats = scheduler.stats().snapshot();
    info!(
        position_cycles = stats.position_cycles,
        roster_refreshes = stats.roster_refreshes,
        "Feed Producer stopped"
    );
    Ok(())
}
