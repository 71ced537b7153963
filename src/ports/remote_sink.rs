use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Error encoding JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Error sending to Shipyard: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Shipyard returned {status} for {path}")]
    Status { status: u16, path: String },
}

/// Port for delivering serialized payloads to the remote service
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// POST `body` (JSON) to `path` under the remote base URL
    async fn post(&self, path: &str, body: Vec<u8>) -> Result<(), UploadError>;
}
