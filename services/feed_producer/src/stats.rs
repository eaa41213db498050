//! Scheduler counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::table::InsertOutcome;

/// Running totals since the scheduler was created
#[derive(Debug, Default)]
pub struct SchedulerStats {
    roster_refreshes: AtomicU64,
    roster_failures: AtomicU64,
    position_cycles: AtomicU64,
    records_admitted: AtomicU64,
    records_replaced: AtomicU64,
    records_discarded: AtomicU64,
    decode_failures: AtomicU64,
    store_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub roster_refreshes: u64,
    pub roster_failures: u64,
    pub position_cycles: u64,
    pub records_admitted: u64,
    pub records_replaced: u64,
    pub records_discarded: u64,
    pub decode_failures: u64,
    pub store_failures: u64,
    pub evictions: u64,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            roster_refreshes: self.roster_refreshes.load(Ordering::Relaxed),
            roster_failures: self.roster_failures.load(Ordering::Relaxed),
            position_cycles: self.position_cycles.load(Ordering::Relaxed),
            records_admitted: self.records_admitted.load(Ordering::Relaxed),
            records_replaced: self.records_replaced.load(Ordering::Relaxed),
            records_discarded: self.records_discarded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn roster_refreshed(&self) {
        self.roster_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn roster_failed(&self) {
        self.roster_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn position_cycle_completed(&self) {
        self.position_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inserted(&self, outcome: InsertOutcome) {
        let counter = match outcome {
            InsertOutcome::Admitted => &self.records_admitted,
            InsertOutcome::Replaced => &self.records_replaced,
            InsertOutcome::Discarded => &self.records_discarded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_failed(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn evicted(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }
}
