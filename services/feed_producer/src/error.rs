//! Error types for the feed producer service

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Scheduler lifecycle misuse
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Refresh scheduler is already running")]
    AlreadyRunning,
}

/// Failures publishing the feed outward
#[derive(Debug, Error)]
pub enum ExportError {
    /// Feed file could not be written
    #[error("Failed to write feed file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Export path has no file name component
    #[error("Invalid feed file path: {0}")]
    InvalidPath(PathBuf),

    /// HTTP endpoint could not bind its address
    #[error("Failed to bind feed endpoint on {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    #[error("Failed to render snapshot: {0}")]
    Render(#[from] serde_json::Error),
}
