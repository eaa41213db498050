//! # Store Adapters
//!
//! ## Purpose
//!
//! Collaborators that answer the two questions the feed producer asks of its
//! document store:
//! - which vehicle identifiers exist at all
//! - what is the newest position document for one vehicle since a cursor
//!
//! ## Backends
//!
//! - [`MongoStore`]: the live MongoDB collection the collector writes to
//! - [`FileStore`]: a collection kept as JSON lines on disk, typically a
//!   `mongoexport` dump an upstream collector appends to
//! - [`MemoryStore`]: documents held in memory, for tests and embedding
//!
//! [`connect`] picks a backend from the configured store URI.
//!
//! ## Architecture Role
//!
//! ```text
//! document store → [store-adapters] → raw Document → codec::decoder → feed-producer
//! ```
//!
//! Adapters hand back raw documents. Decoding, merging and publication are
//! not their concern.

pub mod error;
pub mod file;
pub mod memory;
pub mod mongo;
pub mod store;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use store::{connect, LocationStore};
