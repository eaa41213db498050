//! Feed file writer
//!
//! Rewrites the protobuf feed file after every publication. The new feed is
//! written to a sibling temp file and renamed over the old one, so a reader
//! of the path always sees a complete feed.

use codec::encode_feed;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::FeedSnapshot;

use crate::error::ExportError;

#[derive(Debug, Clone)]
pub struct FeedFileWriter {
    path: PathBuf,
}

impl FeedFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `snapshot` and replace the feed file with it
    pub async fn write(&self, snapshot: &FeedSnapshot) -> Result<usize, ExportError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| ExportError::InvalidPath(self.path.clone()))?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_error(source))?;
        }

        let bytes = encode_feed(snapshot);
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|source| self.write_error(source))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| self.write_error(source))?;

        Ok(bytes.len())
    }

    /// Write every publication until cancelled or the publisher goes away
    ///
    /// Write failures are logged and the next publication is tried anyway.
    pub async fn run(self, mut updates: watch::Receiver<Arc<FeedSnapshot>>, cancel: CancellationToken) {
        info!(path = ?self.path, "Feed file writer started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let snapshot = Arc::clone(&updates.borrow_and_update());
            match self.write(&snapshot).await {
                Ok(bytes) => debug!(path = ?self.path, bytes, vehicles = snapshot.len(), "Feed file written"),
                Err(e) => warn!(error = %e, "Feed file write failed"),
            }
        }

        info!(path = ?self.path, "Feed file writer stopped");
    }

    pub fn spawn(
        self,
        updates: watch::Receiver<Arc<FeedSnapshot>>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(updates, cancel))
    }

    fn write_error(&self, source: std::io::Error) -> ExportError {
        ExportError::Write {
            path: self.path.clone(),
            source,
        }
    }
}
