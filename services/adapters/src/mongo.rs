//! MongoDB store
//!
//! Queries the live location collection directly:
//! - roster: `distinct("entity.id")`
//! - position: newest document for one id with `entity.vehicle.timestamp`
//!   above the cursor, via a descending sort and `find_one`

use async_trait::async_trait;
use codec::Document;
use mongodb::bson::{self, doc, Bson};
use mongodb::{Client, Collection};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::LocationStore;

const ID_FIELD: &str = "entity.id";
const TIMESTAMP_FIELD: &str = "entity.vehicle.timestamp";

/// URI prefixes handled by [`MongoStore`]
pub const MONGO_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];

#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<bson::Document>,
}

impl MongoStore {
    /// Build a client for `uri`
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first query, not here.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        info!(database, collection, "Connected to MongoDB store");
        Ok(Self {
            collection: client.database(database).collection(collection),
        })
    }

    pub fn handles(uri: &str) -> bool {
        MONGO_SCHEMES.iter().any(|scheme| uri.starts_with(scheme))
    }
}

/// Filter for the newest-after-cursor query
fn latest_filter(identifier: &str, cursor_ms: u64) -> bson::Document {
    let cursor = i64::try_from(cursor_ms).unwrap_or(i64::MAX);
    doc! {
        ID_FIELD: identifier,
        TIMESTAMP_FIELD: { "$gt": cursor },
    }
}

/// Identifiers from a `distinct` result; non-string and empty ids are skipped
fn identifiers_from(values: Vec<Bson>) -> BTreeSet<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Bson::String(id) if !id.is_empty() => Some(id),
            other => {
                debug!(value = %other, "Ignoring non-string vehicle id");
                None
            }
        })
        .collect()
}

#[async_trait]
impl LocationStore for MongoStore {
    async fn distinct_identifiers(&self) -> Result<BTreeSet<String>> {
        let values = self.collection.distinct(ID_FIELD, doc! {}).await?;
        Ok(identifiers_from(values))
    }

    async fn latest_since(&self, identifier: &str, cursor_ms: u64) -> Result<Option<Document>> {
        let found = self
            .collection
            .find_one(latest_filter(identifier, cursor_ms))
            .sort(doc! { TIMESTAMP_FIELD: -1 })
            .await?;

        // Relaxed extended JSON keeps numbers native; the decoder reads the rest
        Ok(found.map(|document| Bson::Document(document).into_relaxed_extjson()))
    }
}
