use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapters::procfs::container_metrics;
use crate::domain::{ContainerId, ContainerSnapshot, Destination, WorkUnit};
use crate::ports::{ContainerSource, ProcessError, ProcessSource, RuntimeError};

/// Inspect calls in flight at once while assembling container snapshots
const INSPECT_CONCURRENCY: usize = 8;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Error reading processes: {0}")]
    Process(#[from] ProcessError),

    #[error("Error encoding JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Metrics collection is not enabled")]
    MetricsDisabled,

    #[error("Work queue closed")]
    QueueClosed,
}

/// Periodic jobs, each producing one work unit per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionTask {
    Containers,
    Images,
    Metrics,
}

impl CollectionTask {
    pub fn destination(&self) -> Destination {
        match self {
            Self::Containers => Destination::Containers,
            Self::Images => Destination::Images,
            Self::Metrics => Destination::Metrics,
        }
    }
}

impl std::fmt::Display for CollectionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Containers => f.write_str("containers"),
            Self::Images => f.write_str("images"),
            Self::Metrics => f.write_str("metrics"),
        }
    }
}

/// Runs collection tasks against the Docker daemon and the host
pub struct Collector {
    containers: Arc<dyn ContainerSource>,
    processes: Option<Arc<dyn ProcessSource>>,
}

impl Collector {
    pub fn new(containers: Arc<dyn ContainerSource>) -> Self {
        Self {
            containers,
            processes: None,
        }
    }

    pub fn with_processes(mut self, processes: Arc<dyn ProcessSource>) -> Self {
        self.processes = Some(processes);
        self
    }

    pub async fn collect(&self, task: CollectionTask) -> Result<WorkUnit, CollectError> {
        match task {
            CollectionTask::Containers => {
                WorkUnit::new(task.destination(), self.collect_containers().await?).map_err(Into::into)
            }
            CollectionTask::Images => {
                WorkUnit::new(task.destination(), self.containers.list_images().await?).map_err(Into::into)
            }
            CollectionTask::Metrics => {
                let processes = self.processes.as_ref().ok_or(CollectError::MetricsDisabled)?;
                let samples = processes.list_processes().await?;
                let metrics = container_metrics(&samples);
                debug!(processes = samples.len(), containers = metrics.len(), "Sampled container metrics");
                WorkUnit::new(task.destination(), metrics).map_err(Into::into)
            }
        }
    }

    /// List every container and pair it with its inspect result.
    ///
    /// Any failed call fails the whole snapshot.
    async fn collect_containers(&self) -> Result<Vec<ContainerSnapshot>, CollectError> {
        let summaries = self.containers.list_containers().await?;

        let mut entries = Vec::with_capacity(summaries.len());
        for summary in summaries {
            match ContainerId::from_summary(&summary) {
                Some(id) => entries.push((id, summary)),
                None => warn!(entry = %summary, "Skipping container listing entry without Id"),
            }
        }

        let mut details = Vec::with_capacity(entries.len());
        for chunk in entries.chunks(INSPECT_CONCURRENCY) {
            let inspected =
                try_join_all(chunk.iter().map(|(id, _)| self.containers.inspect_container(id))).await?;
            details.extend(inspected);
        }

        Ok(entries
            .into_iter()
            .zip(details)
            .map(|((_, summary), detail)| ContainerSnapshot::new(summary, detail))
            .collect())
    }
}
