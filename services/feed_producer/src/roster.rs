//! Identifier roster
//!
//! The set of vehicles the position cycle queries. Each roster refresh
//! replaces the whole set; identifiers absent from the new set stop being
//! queried, though their table entries remain.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct IdentifierRoster {
    current: RwLock<Arc<BTreeSet<String>>>,
}

impl IdentifierRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new roster wholesale
    pub fn replace(&self, identifiers: BTreeSet<String>) {
        *self.current.write() = Arc::new(identifiers);
    }

    /// The roster as of now; later replacements do not affect the returned set
    pub fn current(&self) -> Arc<BTreeSet<String>> {
        Arc::clone(&self.current.read())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.current.read().contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_replace_is_total() {
        let roster = IdentifierRoster::new();
        assert!(roster.is_empty());

        roster.replace(ids(&["bus1", "bus2"]));
        roster.replace(ids(&["bus2", "bus3"]));

        assert_eq!(*roster.current(), ids(&["bus2", "bus3"]));
        assert!(!roster.contains("bus1"));
    }

    #[test]
    fn test_held_roster_survives_replacement() {
        let roster = IdentifierRoster::new();
        roster.replace(ids(&["bus1"]));
        let held = roster.current();

        roster.replace(BTreeSet::new());

        assert_eq!(*held, ids(&["bus1"]));
        assert_eq!(roster.len(), 0);
    }
}
