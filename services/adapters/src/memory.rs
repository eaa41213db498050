//! In-memory store

use async_trait::async_trait;
use codec::Document;
use parking_lot::RwLock;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::store::{distinct_of, latest_of, LocationStore};

/// Documents held in memory, queried with the same rules as [`FileStore`](crate::FileStore)
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, document: Document) {
        self.documents.write().push(document);
    }

    pub fn extend(&self, documents: impl IntoIterator<Item = Document>) {
        self.documents.write().extend(documents);
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

impl FromIterator<Document> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn distinct_identifiers(&self) -> Result<BTreeSet<String>> {
        Ok(distinct_of(self.documents.read().iter()))
    }

    async fn latest_since(&self, identifier: &str, cursor_ms: u64) -> Result<Option<Document>> {
        Ok(latest_of(self.documents.read().iter(), identifier, cursor_ms).cloned())
    }
}
