use serde::{Deserialize, Serialize};

use super::ContainerId;

/// A single named reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub value: u64,
    pub unit: String,
}

impl Counter {
    pub fn new(name: impl Into<String>, value: u64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Resource usage summed over the processes of one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetric {
    pub container_id: ContainerId,
    pub counters: Vec<Counter>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContainerMetric {
    pub fn new(container_id: ContainerId, cpu_percent: u64, memory_kb: u64) -> Self {
        Self {
            container_id,
            counters: vec![
                Counter::new("cpu", cpu_percent, "%"),
                Counter::new("memory", memory_kb, "kb"),
            ],
            kind: "container".to_string(),
        }
    }

    #[cfg(test)]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.iter().find(|c| c.name == name).map(|c| c.value)
    }
}
