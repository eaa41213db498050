//! Location table
//!
//! One entry per vehicle, always holding the newest record seen for it.
//! Owned by the position refresher; readers only ever see snapshots.

use std::collections::HashMap;
use types::{FeedSnapshot, PositionRecord};

/// What `insert` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First record for this identifier
    Admitted,
    /// Strictly newer than the stored record, which it replaced
    Replaced,
    /// Same age or older than the stored record; table unchanged
    Discarded,
}

#[derive(Debug, Default)]
pub struct LocationTable {
    entries: HashMap<String, PositionRecord>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-replace by timestamp
    ///
    /// A record only replaces the stored one when its timestamp is strictly
    /// greater; a tie keeps the incumbent.
    pub fn insert(&mut self, record: PositionRecord) -> InsertOutcome {
        if let Some(current) = self.entries.get_mut(record.identifier()) {
            if record.timestamp_ms() > current.timestamp_ms() {
                *current = record;
                InsertOutcome::Replaced
            } else {
                InsertOutcome::Discarded
            }
        } else {
            self.entries.insert(record.identifier().to_owned(), record);
            InsertOutcome::Admitted
        }
    }

    /// Immutable copy of every entry, stamped with `created_at_ms`
    pub fn snapshot(&self, created_at_ms: u64) -> FeedSnapshot {
        FeedSnapshot::new(self.entries.values().cloned().collect(), created_at_ms)
    }

    /// Drop entries whose age at `now_ms` exceeds `age_limit_ms`; returns how many went
    pub fn evict_older_than(&mut self, now_ms: u64, age_limit_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, record| record.age_ms(now_ms) <= age_limit_ms);
        before - self.entries.len()
    }

    pub fn get(&self, identifier: &str) -> Option<&PositionRecord> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, timestamp_ms: u64) -> PositionRecord {
        PositionRecord::new(id, 39.95, -75.16, 90.0, 4.0, timestamp_ms).unwrap()
    }

    #[test]
    fn test_older_record_never_replaces_newer() {
        let mut table = LocationTable::new();
        assert_eq!(table.insert(record("bus1", 1000)), InsertOutcome::Admitted);
        assert_eq!(table.insert(record("bus1", 900)), InsertOutcome::Discarded);
        assert_eq!(table.get("bus1").unwrap().timestamp_ms(), 1000);

        assert_eq!(table.insert(record("bus2", 500)), InsertOutcome::Admitted);

        let snapshot = table.snapshot(2_000);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("bus1").unwrap().timestamp_ms(), 1000);
        assert_eq!(snapshot.get("bus2").unwrap().timestamp_ms(), 500);
        assert_eq!(snapshot.max_timestamp_ms(), 1000);
    }

    #[test]
    fn test_tie_keeps_incumbent() {
        let mut table = LocationTable::new();
        let first = PositionRecord::new("bus1", 1.0, 1.0, 0.0, 0.0, 1000).unwrap();
        let rival = PositionRecord::new("bus1", 2.0, 2.0, 0.0, 0.0, 1000).unwrap();

        table.insert(first.clone());
        assert_eq!(table.insert(rival), InsertOutcome::Discarded);
        assert_eq!(table.get("bus1"), Some(&first));
    }

    #[test]
    fn test_newer_record_replaces() {
        let mut table = LocationTable::new();
        table.insert(record("bus1", 1000));
        assert_eq!(table.insert(record("bus1", 1001)), InsertOutcome::Replaced);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("bus1").unwrap().timestamp_ms(), 1001);
    }

    #[test]
    fn test_empty_snapshot() {
        let table = LocationTable::new();
        let snapshot = table.snapshot(42);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.max_timestamp_ms(), 0);
        assert_eq!(snapshot.created_at_ms(), 42);
    }

    #[test]
    fn test_eviction_removes_only_stale_entries() {
        let mut table = LocationTable::new();
        table.insert(record("fresh", 9_500));
        table.insert(record("edge", 9_000));
        table.insert(record("stale", 8_999));

        assert_eq!(table.evict_older_than(10_000, 1_000), 1);
        assert!(table.get("stale").is_none());
        assert!(table.get("edge").is_some());
        assert!(table.get("fresh").is_some());
    }

    #[test]
    fn test_snapshot_is_detached_from_table() {
        let mut table = LocationTable::new();
        table.insert(record("bus1", 10));
        let snapshot = table.snapshot(100);

        table.insert(record("bus1", 20));
        table.insert(record("bus9", 30));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("bus1").unwrap().timestamp_ms(), 10);
    }

    proptest! {
        #[test]
        fn prop_entry_holds_max_timestamp(
            inserts in prop::collection::vec((0usize..4, 0u64..10_000), 1..64)
        ) {
            let ids = ["bus1", "bus2", "bus3", "bus4"];
            let mut table = LocationTable::new();
            let mut expected = HashMap::new();

            for (slot, ts) in &inserts {
                table.insert(record(ids[*slot], *ts));
                let max = expected.entry(ids[*slot]).or_insert(*ts);
                *max = (*max).max(*ts);
            }

            prop_assert_eq!(table.len(), expected.len());
            for (id, ts) in &expected {
                prop_assert_eq!(table.get(id).unwrap().timestamp_ms(), *ts);
            }
            let max = expected.values().copied().max().unwrap_or(0);
            prop_assert_eq!(table.snapshot(0).max_timestamp_ms(), max);
        }

        #[test]
        fn prop_repeated_insert_is_idempotent(ts in 0u64..u64::MAX, repeats in 1usize..8) {
            let mut table = LocationTable::new();
            table.insert(record("bus1", ts));
            let once = table.snapshot(0);

            for _ in 0..repeats {
                prop_assert_eq!(table.insert(record("bus1", ts)), InsertOutcome::Discarded);
            }
            prop_assert_eq!(table.snapshot(0), once);
        }
    }
}
