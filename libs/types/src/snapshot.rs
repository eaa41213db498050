//! Immutable feed snapshot
//!
//! A snapshot is built once per position-refresh cycle and then only ever
//! shared behind an `Arc`. Readers holding an older snapshot keep a fully
//! consistent view after a newer one has been published.

use serde::Serialize;

use crate::position::PositionRecord;

/// Point-in-time export of every known vehicle's latest position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    records: Vec<PositionRecord>,
    max_timestamp_ms: u64,
    created_at_ms: u64,
}

impl FeedSnapshot {
    /// Build a snapshot from the given records
    ///
    /// Records are sorted by identifier so encoded feeds are deterministic.
    /// `max_timestamp_ms` is derived here and is 0 for an empty snapshot.
    pub fn new(mut records: Vec<PositionRecord>, created_at_ms: u64) -> Self {
        records.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        let max_timestamp_ms = records
            .iter()
            .map(PositionRecord::timestamp_ms)
            .max()
            .unwrap_or(0);

        Self {
            records,
            max_timestamp_ms,
            created_at_ms,
        }
    }

    /// Snapshot published before the first position-refresh cycle completes
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn records(&self) -> &[PositionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Greatest record timestamp, used as the next query cursor
    pub fn max_timestamp_ms(&self) -> u64 {
        self.max_timestamp_ms
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    /// Look up one vehicle by identifier
    pub fn get(&self, identifier: &str) -> Option<&PositionRecord> {
        self.records
            .binary_search_by(|record| record.identifier().cmp(identifier))
            .ok()
            .map(|index| &self.records[index])
    }
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
