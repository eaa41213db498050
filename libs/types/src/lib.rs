//! # Vehicle Position Types
//!
//! Plain data types shared by every crate in the feed producer workspace.
//!
//! ## Contents
//!
//! - [`PositionRecord`]: one vehicle's reported position at one instant
//! - [`FeedSnapshot`]: an immutable, point-in-time export of every vehicle's
//!   latest known position, plus the cursor for the next store query
//!
//! ## Architecture Role
//!
//! ```text
//! store documents → [codec::decoder] → PositionRecord → [LocationTable]
//!                                                            ↓
//!                 exporters ← [codec::feed] ← FeedSnapshot ←─┘
//! ```
//!
//! This crate carries no behaviour beyond construction and accessors; the
//! merge rules live in the producer service and the wire formats in `codec`.

pub mod position;
pub mod snapshot;

pub use position::{PositionRecord, RecordError};
pub use snapshot::FeedSnapshot;
