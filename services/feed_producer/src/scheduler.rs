//! Refresh scheduler
//!
//! Drives two independent periodic cycles:
//!
//! - **roster**: asks the store for every known identifier and replaces the
//!   [`IdentifierRoster`] wholesale
//! - **position**: asks the store for each rostered vehicle's newest record
//!   since the cursor, merges it into the [`LocationTable`] and publishes an
//!   immutable [`FeedSnapshot`]
//!
//! Each cycle runs in its own task on a `tokio::time::interval` whose first
//! tick fires immediately. A cycle is awaited before the next tick is taken,
//! so a slow cycle delays the next one instead of overlapping it. The first
//! position cycle waits for the first roster attempt to finish, for at most
//! one position period.
//!
//! Readers get snapshots through a `watch` channel; publication is a single
//! pointer swap, so nobody ever sees a half-built feed.

use chrono::Utc;
use codec::decode_position;
use parking_lot::Mutex;
use producer_config::RefreshSettings;
use std::sync::Arc;
use std::time::Duration;
use store_adapters::{LocationStore, StoreError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::FeedSnapshot;

use crate::error::SchedulerError;
use crate::roster::IdentifierRoster;
use crate::stats::SchedulerStats;
use crate::table::LocationTable;

const ROSTER_CYCLE: &str = "roster";
const POSITION_CYCLE: &str = "position";

/// Smallest period handed to `tokio::time::interval`, which rejects zero
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Cadence and merge policy for a [`RefreshScheduler`]
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub roster_interval: Duration,
    pub position_interval: Duration,
    /// Evict entries older than this after each position cycle
    pub stale_age_limit_ms: Option<u64>,
    pub initial_cursor_ms: u64,
}

impl From<&RefreshSettings> for SchedulerOptions {
    fn from(settings: &RefreshSettings) -> Self {
        Self {
            roster_interval: settings.roster_interval(),
            position_interval: settings.position_interval(),
            stale_age_limit_ms: settings.stale_age_limit_ms,
            initial_cursor_ms: settings.initial_cursor_ms,
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from(&RefreshSettings::default())
    }
}

/// Run one roster cycle: replace the roster with the store's identifier set
///
/// On failure the previous roster stays in place and the error is returned
/// after being logged.
pub async fn refresh_roster(
    store: &dyn LocationStore,
    roster: &IdentifierRoster,
    stats: &SchedulerStats,
) -> Result<usize, StoreError> {
    match store.distinct_identifiers().await {
        Ok(identifiers) => {
            let count = identifiers.len();
            roster.replace(identifiers);
            stats.roster_refreshed();
            info!(cycle = ROSTER_CYCLE, vehicles = count, "Roster refreshed");
            Ok(count)
        }
        Err(e) => {
            stats.roster_failed();
            warn!(
                cycle = ROSTER_CYCLE,
                error = %e,
                retained = roster.len(),
                "Roster refresh failed, keeping previous roster"
            );
            Err(e)
        }
    }
}

/// Owner of the location table and the cursor
///
/// Everything the position cycle mutates lives here, so a scheduler restart
/// resumes with the same table and cursor.
pub struct PositionRefresher {
    store: Arc<dyn LocationStore>,
    roster: Arc<IdentifierRoster>,
    stats: Arc<SchedulerStats>,
    table: LocationTable,
    cursor_ms: u64,
    stale_age_limit_ms: Option<u64>,
}

impl PositionRefresher {
    pub fn new(
        store: Arc<dyn LocationStore>,
        roster: Arc<IdentifierRoster>,
        stats: Arc<SchedulerStats>,
        options: &SchedulerOptions,
    ) -> Self {
        Self {
            store,
            roster,
            stats,
            table: LocationTable::new(),
            cursor_ms: options.initial_cursor_ms,
            stale_age_limit_ms: options.stale_age_limit_ms,
        }
    }

    /// Lower bound, exclusive, for the next round of store queries
    pub fn cursor_ms(&self) -> u64 {
        self.cursor_ms
    }

    pub fn table(&self) -> &LocationTable {
        &self.table
    }

    /// Run one position cycle against the wall clock
    pub async fn run_cycle(&mut self) -> FeedSnapshot {
        self.run_cycle_at(wall_clock_ms()).await
    }

    /// Run one position cycle with `now_ms` as the snapshot and eviction time
    ///
    /// Every rostered identifier is queried with the cursor as it stood when
    /// the cycle began. Store and decode failures skip that identifier only.
    /// The cursor advances to the snapshot's newest timestamp.
    pub async fn run_cycle_at(&mut self, now_ms: u64) -> FeedSnapshot {
        let identifiers = self.roster.current();
        let cursor_ms = self.cursor_ms;

        for identifier in identifiers.iter() {
            let document = match self.store.latest_since(identifier, cursor_ms).await {
                Ok(Some(document)) => document,
                Ok(None) => {
                    debug!(cycle = POSITION_CYCLE, identifier = %identifier, cursor_ms, "No newer record");
                    continue;
                }
                Err(e) => {
                    self.stats.store_failed();
                    warn!(cycle = POSITION_CYCLE, identifier = %identifier, error = %e, "Store query failed");
                    continue;
                }
            };

            match decode_position(&document) {
                Ok(record) => {
                    let outcome = self.table.insert(record);
                    self.stats.record_inserted(outcome);
                    debug!(cycle = POSITION_CYCLE, identifier = %identifier, ?outcome, "Merged record");
                }
                Err(e) => {
                    self.stats.decode_failed();
                    warn!(cycle = POSITION_CYCLE, identifier = %identifier, error = %e, "Skipping undecodable record");
                }
            }
        }

        if let Some(age_limit_ms) = self.stale_age_limit_ms {
            let evicted = self.table.evict_older_than(now_ms, age_limit_ms);
            if evicted > 0 {
                self.stats.evicted(evicted);
                debug!(cycle = POSITION_CYCLE, evicted, age_limit_ms, "Evicted stale entries");
            }
        }

        let snapshot = self.table.snapshot(now_ms);
        self.cursor_ms = snapshot.max_timestamp_ms();
        self.stats.position_cycle_completed();

        info!(
            cycle = POSITION_CYCLE,
            queried = identifiers.len(),
            vehicles = snapshot.len(),
            cursor_ms = self.cursor_ms,
            "Position cycle complete"
        );
        snapshot
    }
}

struct RunningTasks {
    cancel: CancellationToken,
    roster_task: JoinHandle<()>,
    position_task: JoinHandle<()>,
}

/// Owns both refresh cycles and the published snapshot
pub struct RefreshScheduler {
    store: Arc<dyn LocationStore>,
    roster: Arc<IdentifierRoster>,
    refresher: Arc<tokio::sync::Mutex<PositionRefresher>>,
    stats: Arc<SchedulerStats>,
    publisher: watch::Sender<Arc<FeedSnapshot>>,
    options: SchedulerOptions,
    running: Mutex<Option<RunningTasks>>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<dyn LocationStore>, options: SchedulerOptions) -> Self {
        let roster = Arc::new(IdentifierRoster::new());
        let stats = Arc::new(SchedulerStats::new());
        let refresher = PositionRefresher::new(
            Arc::clone(&store),
            Arc::clone(&roster),
            Arc::clone(&stats),
            &options,
        );
        let (publisher, _) = watch::channel(Arc::new(FeedSnapshot::empty()));

        Self {
            store,
            roster,
            refresher: Arc::new(tokio::sync::Mutex::new(refresher)),
            stats,
            publisher,
            options,
            running: Mutex::new(None),
        }
    }

    /// Spawn both cycles; their first ticks fire immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let (roster_ready, roster_ready_rx) = oneshot::channel();

        let roster_task = tokio::spawn(roster_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.roster),
            Arc::clone(&self.stats),
            self.options.roster_interval,
            roster_ready,
            cancel.clone(),
        ));
        let position_task = tokio::spawn(position_loop(
            Arc::clone(&self.refresher),
            self.publisher.clone(),
            self.options.position_interval,
            roster_ready_rx,
            cancel.clone(),
        ));

        *running = Some(RunningTasks {
            cancel,
            roster_task,
            position_task,
        });

        info!(
            roster_interval = ?self.options.roster_interval,
            position_interval = ?self.options.position_interval,
            "Refresh scheduler started"
        );
        Ok(())
    }

    /// Cancel both cycles and wait for their tasks to exit
    ///
    /// Pending ticks never run and an in-flight cycle is abandoned without
    /// publishing. Stopping a stopped scheduler does nothing.
    pub async fn stop(&self) {
        let Some(tasks) = self.running.lock().take() else {
            return;
        };

        tasks.cancel.cancel();
        for (name, task) in [(ROSTER_CYCLE, tasks.roster_task), (POSITION_CYCLE, tasks.position_task)] {
            if let Err(e) = task.await {
                warn!(cycle = name, error = %e, "Refresh task ended abnormally");
            }
        }
        info!("Refresh scheduler stopped");
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.lock().is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.publisher.subscribe()
    }

    /// Most recently published snapshot; empty before the first position cycle
    pub fn latest(&self) -> Arc<FeedSnapshot> {
        Arc::clone(&self.publisher.borrow())
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    pub fn roster(&self) -> Arc<IdentifierRoster> {
        Arc::clone(&self.roster)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(tasks) = self.running.get_mut().take() {
            tasks.cancel.cancel();
        }
    }
}

async fn roster_loop(
    store: Arc<dyn LocationStore>,
    roster: Arc<IdentifierRoster>,
    stats: Arc<SchedulerStats>,
    period: Duration,
    ready: oneshot::Sender<()>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ready = Some(ready);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            // Failures are logged and counted inside refresh_roster
            _ = refresh_roster(store.as_ref(), &roster, &stats) => {}
        }

        if let Some(ready) = ready.take() {
            let _ = ready.send(());
        }
    }

    debug!(cycle = ROSTER_CYCLE, "Refresh loop exited");
}

async fn position_loop(
    refresher: Arc<tokio::sync::Mutex<PositionRefresher>>,
    publisher: watch::Sender<Arc<FeedSnapshot>>,
    period: Duration,
    roster_ready: oneshot::Receiver<()>,
    cancel: CancellationToken,
) {
    let period = period.max(MIN_PERIOD);

    // A hung roster query must not hold back position publication forever
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        gate = tokio::time::timeout(period, roster_ready) => {
            if gate.is_err() {
                warn!(
                    cycle = POSITION_CYCLE,
                    waited = ?period,
                    "First roster refresh still pending, starting position cycle without it"
                );
            }
        }
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let cycle = async { refresher.lock().await.run_cycle().await };
        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            snapshot = cycle => snapshot,
        };

        publisher.send_replace(Arc::new(snapshot));
    }

    debug!(cycle = POSITION_CYCLE, "Refresh loop exited");
}

fn wall_clock_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
