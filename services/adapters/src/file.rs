//! JSON-lines file store
//!
//! A collection lives at `<root>/<database>/<collection>.jsonl`, one document
//! per line. Parsed documents are cached and reused until the file's
//! modification time or length changes, so documents appended by an
//! upstream collector become visible on the next query while a position
//! cycle over many identifiers parses the file once.

use async_trait::async_trait;
use codec::Document;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::store::{distinct_of, latest_of, LocationStore};

/// File identity the cached parse was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

#[derive(Debug)]
struct CachedCollection {
    stamp: FileStamp,
    documents: Arc<Vec<Document>>,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<CachedCollection>>,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>, database: &str, collection: &str) -> Self {
        let path = root
            .as_ref()
            .join(database)
            .join(format!("{}.jsonl", collection));
        Self {
            path,
            cache: Mutex::new(None),
        }
    }

    /// Backing file of the collection
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_documents(&self) -> Result<Arc<Vec<Document>>> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.unavailable()),
            Err(e) => return Err(e.into()),
        };
        let stamp = FileStamp {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };

        if let Some(cached) = self.cache.lock().as_ref() {
            if cached.stamp == stamp {
                return Ok(Arc::clone(&cached.documents));
            }
        }

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.unavailable()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Document>(line) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!(
                    path = ?self.path,
                    line = index + 1,
                    error = %e,
                    "Skipping unparseable store line"
                ),
            }
        }

        debug!(path = ?self.path, documents = documents.len(), "Read collection");
        let documents = Arc::new(documents);
        *self.cache.lock() = Some(CachedCollection {
            stamp,
            documents: Arc::clone(&documents),
        });
        Ok(documents)
    }

    fn unavailable(&self) -> StoreError {
        StoreError::Unavailable {
            location: self.path.display().to_string(),
            reason: "collection file does not exist".to_string(),
        }
    }
}

#[async_trait]
impl LocationStore for FileStore {
    async fn distinct_identifiers(&self) -> Result<BTreeSet<String>> {
        let documents = self.read_documents().await?;
        Ok(distinct_of(documents.iter()))
    }

    async fn latest_since(&self, identifier: &str, cursor_ms: u64) -> Result<Option<Document>> {
        let documents = self.read_documents().await?;
        Ok(latest_of(documents.iter(), identifier, cursor_ms).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_unchanged_file_is_parsed_once() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "transit", "locations");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{\"entity\":{\"id\":\"bus1\"}}\n").unwrap();

        let first = store.read_documents().await.unwrap();
        let second = store.read_documents().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        fs::write(store.path(), "{\"entity\":{\"id\":\"bus1\"}}\n{\"entity\":{\"id\":\"bus2\"}}\n").unwrap();
        let third = store.read_documents().await.unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn test_removed_file_is_unavailable_despite_cache() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "transit", "locations");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{}\n").unwrap();
        store.read_documents().await.unwrap();

        fs::remove_file(store.path()).unwrap();
        assert!(matches!(
            store.read_documents().await,
            Err(StoreError::Unavailable { .. })
        ));
    }
}
