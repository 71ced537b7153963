use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ProcessSample;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Process scan aborted: {0}")]
    Scan(#[from] tokio::task::JoinError),
}

/// Port for sampling host processes
#[async_trait]
pub trait ProcessSource: Send + Sync {
    /// Sample every process currently visible on the host
    async fn list_processes(&self) -> Result<Vec<ProcessSample>, ProcessError>;
}
