//! Location store trait and URI-based backend selection

use async_trait::async_trait;
use codec::{document_identifier, document_timestamp_ms, Document};
use producer_config::StoreSettings;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::error::{Result, StoreError};
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::mongo::MongoStore;

/// Query surface of a vehicle location collection
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Every distinct `entity.id` present in the collection
    async fn distinct_identifiers(&self) -> Result<BTreeSet<String>>;

    /// The document for `identifier` with the greatest
    /// `entity.vehicle.timestamp` strictly greater than `cursor_ms`
    async fn latest_since(&self, identifier: &str, cursor_ms: u64) -> Result<Option<Document>>;
}

/// Open the store named by `settings.uri`
///
/// `mongodb://` and `mongodb+srv://` open the MongoDB collection;
/// `file://<root>` opens `<root>/<database>/<collection>.jsonl`; `memory:`
/// opens an empty in-memory store.
pub async fn connect(settings: &StoreSettings) -> Result<Arc<dyn LocationStore>> {
    // Checked before URL parsing; multi-host MongoDB URIs are not valid URLs
    if MongoStore::handles(&settings.uri) {
        let store = MongoStore::connect(&settings.uri, &settings.database, &settings.collection).await?;
        return Ok(Arc::new(store));
    }

    let url = Url::parse(&settings.uri).map_err(|e| StoreError::InvalidUri {
        uri: settings.uri.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "file" => {
            let root = url.to_file_path().map_err(|_| StoreError::InvalidUri {
                uri: settings.uri.clone(),
                reason: "not a local path".to_string(),
            })?;
            let store = FileStore::new(root, &settings.database, &settings.collection);
            info!(path = ?store.path(), "Connected to file store");
            Ok(Arc::new(store))
        }
        "memory" => {
            info!(
                database = %settings.database,
                collection = %settings.collection,
                "Connected to in-memory store"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(StoreError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

/// Distinct identifiers over a document set; documents without a usable id are ignored
pub(crate) fn distinct_of<'a>(documents: impl IntoIterator<Item = &'a Document>) -> BTreeSet<String> {
    documents
        .into_iter()
        .filter_map(|doc| document_identifier(doc).ok())
        .map(str::to_owned)
        .collect()
}

/// Newest document for `identifier` after `cursor_ms`
///
/// Documents whose timestamp cannot be read are not candidates. On equal
/// timestamps the later document in iteration order wins.
pub(crate) fn latest_of<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    identifier: &str,
    cursor_ms: u64,
) -> Option<&'a Document> {
    let mut best: Option<(u64, &Document)> = None;

    for doc in documents {
        if document_identifier(doc).ok() != Some(identifier) {
            continue;
        }
        let Ok(timestamp_ms) = document_timestamp_ms(doc) else {
            continue;
        };
        if timestamp_ms <= cursor_ms {
            continue;
        }
        match best {
            Some((best_ms, _)) if best_ms > timestamp_ms => {}
            _ => best = Some((timestamp_ms, doc)),
        }
    }

    best.map(|(_, doc)| doc)
}
