use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the `Id` field of a Docker container listing entry
    pub fn from_summary(summary: &Value) -> Option<Self> {
        summary
            .get("Id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContainerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Listing entry paired with its full inspect result.
///
/// Both halves are passed through exactly as Docker returned them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    #[serde(rename = "Container")]
    pub summary: Value,
    #[serde(rename = "Meta")]
    pub detail: Value,
}

impl ContainerSnapshot {
    pub fn new(summary: Value, detail: Value) -> Self {
        Self { summary, detail }
    }
}
