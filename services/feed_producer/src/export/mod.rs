//! Feed exporters
//!
//! Both exporters consume published snapshots from the scheduler's `watch`
//! channel and never touch the location table.

pub mod file_writer;
pub mod http;

pub use file_writer::FeedFileWriter;
pub use http::FeedHttpServer;
