//! # Vehicle Position Codec
//!
//! ## Purpose
//!
//! The "rules" layer between raw store documents and the published feed:
//! - Decoding of one store document into a typed [`PositionRecord`](types::PositionRecord)
//! - GTFS-realtime message definitions for the VehiclePositions feed
//! - Encoding of a [`FeedSnapshot`](types::FeedSnapshot) into feed bytes
//!
//! ## Architecture Role
//!
//! ```text
//! store adapters → [codec::decoder] → producer service → [codec::feed] → exporters
//!   raw JSON          typed records     merge + publish     protobuf      file / HTTP
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Store connections or query logic (belongs in `store-adapters`)
//! - Merge, scheduling or publication (belongs in `feed-producer`)
//! - File or network transport
//!
//! Every function here is pure.

pub mod decoder;
pub mod error;
pub mod feed;
pub mod gtfs_realtime;

pub use decoder::{decode_position, document_identifier, document_timestamp_ms, Document};
pub use error::{DecodeError, DecodeResult, FeedError};
pub use feed::{build_feed_entity, build_feed_message, decode_feed, encode_feed, GTFS_REALTIME_VERSION};
