use serde::Serialize;
use serde_json::Value;

/// Shipyard endpoint a work unit is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Containers,
    Images,
    Metrics,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Containers => "/agent/containers/",
            Self::Images => "/agent/images/",
            Self::Metrics => "/agent/metrics/",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// One payload produced by a collection task, uploaded exactly once
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub destination: Destination,
    pub payload: Value,
}

impl WorkUnit {
    pub fn new(destination: Destination, payload: impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            destination,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn path(&self) -> &'static str {
        self.destination.path()
    }

    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.payload)
    }
}
