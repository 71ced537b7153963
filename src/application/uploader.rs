use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::WorkUnit;
use crate::ports::{RemoteSink, UploadError};

use super::queue::WorkReceiver;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub delivered: u64,
    pub dropped: u64,
}

/// Single consumer relaying work units to the remote service.
///
/// Delivery is best effort: a failed upload is logged and the unit dropped.
pub struct Uploader {
    sink: Arc<dyn RemoteSink>,
}

impl Uploader {
    pub fn new(sink: Arc<dyn RemoteSink>) -> Self {
        Self { sink }
    }

    /// Drain `queue` on a background task until every sender is dropped.
    ///
    /// Awaiting the handle waits for the in-flight upload to finish.
    pub fn spawn(self, queue: WorkReceiver) -> JoinHandle<UploadStats> {
        tokio::spawn(self.run(queue))
    }

    pub async fn run(self, mut queue: WorkReceiver) -> UploadStats {
        let mut stats = UploadStats::default();

        while let Some(unit) = queue.recv().await {
            match self.upload(&unit).await {
                Ok(()) => {
                    stats.delivered += 1;
                    debug!(path = unit.path(), "Uploaded work unit");
                }
                Err(e) => {
                    stats.dropped += 1;
                    warn!(path = unit.path(), error = %e, "Dropping work unit");
                }
            }
        }

        debug!(delivered = stats.delivered, dropped = stats.dropped, "Uploader stopped");
        stats
    }

    async fn upload(&self, unit: &WorkUnit) -> Result<(), UploadError> {
        let body = unit.to_body()?;
        self.sink.post(unit.path(), body).await
    }
}
