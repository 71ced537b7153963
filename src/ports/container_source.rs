use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{ContainerId, Image};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The socket or TCP endpoint could not be dialed at all
    #[error("Docker unreachable at {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Docker request failed: {0}")]
    Transport(#[source] BoxError),

    #[error("Docker returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Error parsing JSON from Docker: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RuntimeError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Port for fetching container and image inventory
#[async_trait]
pub trait ContainerSource: Send + Sync {
    /// List all containers (running and stopped)
    async fn list_containers(&self) -> Result<Vec<Value>, RuntimeError>;

    /// Full inspect result for one container
    async fn inspect_container(&self, id: &ContainerId) -> Result<Value, RuntimeError>;

    /// List images, excluding intermediate layers
    async fn list_images(&self) -> Result<Vec<Image>, RuntimeError>;
}
