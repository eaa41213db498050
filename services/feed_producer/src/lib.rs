//! # Vehicle Positions Feed Producer
//!
//! ## Purpose
//!
//! Periodically polls a location store and maintains a GTFS-realtime
//! VehiclePositions feed describing the latest known position of every
//! vehicle.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────── roster cycle (hours) ────────────┐
//!                  │  store.distinct_identifiers() → roster swap  │
//!                  └──────────────────────────────────────────────┘
//! LocationStore ──▶
//!                  ┌──────────── position cycle (seconds) ────────────────────────┐
//!                  │  per identifier: latest_since(cursor) → decode → table merge │
//!                  │  → snapshot → watch publish → cursor = snapshot max          │
//!                  └──────────────────────────────────────────────────────────────┘
//!                                              │
//!                          ┌───────────────────┴───────────────────┐
//!                   FeedFileWriter                          FeedHttpServer
//! ```
//!
//! - [`table::LocationTable`]: newest record per vehicle, never regressing
//! - [`roster::IdentifierRoster`]: the vehicles worth querying, replaced wholesale
//! - [`scheduler::RefreshScheduler`]: both cycles plus snapshot publication
//! - [`export`]: consumers of published snapshots
//!
//! ## Usage
//!
//! ```rust,no_run
//! use feed_producer::{RefreshScheduler, SchedulerOptions};
//! use store_adapters::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = RefreshScheduler::new(Arc::new(MemoryStore::new()), SchedulerOptions::default());
//! scheduler.start()?;
//!
//! let mut feed = scheduler.subscribe();
//! feed.changed().await?;
//! println!("{} vehicles", feed.borrow().len());
//!
//! scheduler.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod roster;
pub mod scheduler;
pub mod stats;
pub mod table;

pub use error::{ExportError, SchedulerError};
pub use export::{FeedFileWriter, FeedHttpServer};
pub use roster::IdentifierRoster;
pub use scheduler::{
    refresh_roster, PositionRefresher, RefreshScheduler, SchedulerOptions, SchedulerState,
};
pub use stats::{SchedulerStats, StatsSnapshot};
pub use table::{InsertOutcome, LocationTable};
