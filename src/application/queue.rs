//! Bounded FIFO of work units between collection tasks and the uploader.
//!
//! `send` waits while the queue is full, so a slow or unreachable remote
//! service throttles collection instead of growing memory.

use tokio::sync::mpsc;

use crate::domain::WorkUnit;

use super::collect::CollectError;

pub fn work_queue(capacity: usize) -> (WorkSender, WorkReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (WorkSender(tx), WorkReceiver(rx))
}

#[derive(Debug, Clone)]
pub struct WorkSender(mpsc::Sender<WorkUnit>);

impl WorkSender {
    pub async fn send(&self, unit: WorkUnit) -> Result<(), CollectError> {
        self.0.send(unit).await.map_err(|_| CollectError::QueueClosed)
    }

    /// Units waiting to be uploaded
    pub fn pending(&self) -> usize {
        self.0.max_capacity() - self.0.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.0.max_capacity()
    }
}

#[derive(Debug)]
pub struct WorkReceiver(mpsc::Receiver<WorkUnit>);

impl WorkReceiver {
    /// Next unit in enqueue order, `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<WorkUnit> {
        self.0.recv().await
    }
}
