use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::collect::{CollectError, CollectionTask, Collector};
use super::queue::WorkSender;

/// Outcome of one cycle's fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub enqueued: usize,
    pub failed: usize,
}

/// Fixed-interval driver that fans collection tasks out every tick.
///
/// Cycles are not serialized against each other; a slow cycle overlaps the
/// next one and only the bounded queue holds producers back.
pub struct SyncEngine {
    name: &'static str,
    collector: Arc<Collector>,
    tasks: Arc<[CollectionTask]>,
    interval: Duration,
    sender: WorkSender,
}

impl SyncEngine {
    pub fn new(
        name: &'static str,
        collector: Arc<Collector>,
        tasks: Vec<CollectionTask>,
        interval: Duration,
        sender: WorkSender,
    ) -> Self {
        Self {
            name,
            collector,
            tasks: tasks.into(),
            interval,
            sender,
        }
    }

    /// Tick until `shutdown` fires, then wait for outstanding cycles.
    ///
    /// The queue sender is dropped on return, which lets the uploader finish.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            engine = self.name,
            interval_secs = self.interval.as_secs_f64(),
            tasks = ?self.tasks,
            queue_capacity = self.sender.max_capacity(),
            "Starting sync engine"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let mut cycles = JoinSet::new();
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle += 1;
                    cycles.spawn(run_cycle(
                        cycle,
                        self.collector.clone(),
                        self.tasks.clone(),
                        self.sender.clone(),
                    ));
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    self.log_cycle(joined);
                }
                _ = shutdown.recv() => {
                    info!(engine = self.name, "Shutting down sync engine");
                    break;
                }
            }
        }

        while let Some(joined) = cycles.join_next().await {
            self.log_cycle(joined);
        }

        cycle
    }

    fn log_cycle(&self, joined: Result<CycleReport, tokio::task::JoinError>) {
        match joined {
            Ok(report) => debug!(
                engine = self.name,
                cycle = report.cycle,
                enqueued = report.enqueued,
                failed = report.failed,
                queued = self.sender.pending(),
                "Cycle complete"
            ),
            Err(e) => error!(engine = self.name, error = %e, "Cycle panicked"),
        }
    }
}

/// Run every task concurrently, enqueue what they produce and join them all.
pub async fn run_cycle(
    cycle: u64,
    collector: Arc<Collector>,
    tasks: Arc<[CollectionTask]>,
    sender: WorkSender,
) -> CycleReport {
    let started = Instant::now();
    let mut set = JoinSet::new();

    for &task in tasks.iter() {
        let collector = collector.clone();
        let sender = sender.clone();
        set.spawn(async move {
            let result: Result<(), CollectError> = async {
                let unit = collector.collect(task).await?;
                sender.send(unit).await
            }
            .await;
            (task, result)
        });
    }

    let mut report = CycleReport {
        cycle,
        ..Default::default()
    };
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => report.enqueued += 1,
            Ok((task, Err(e))) => {
                report.failed += 1;
                warn!(cycle, task = %task, error = %e, "Collection task failed");
            }
            Err(e) => {
                report.failed += 1;
                error!(cycle, error = %e, "Collection task panicked");
            }
        }
    }

    debug!(cycle, elapsed_ms = started.elapsed().as_millis() as u64, "Cycle joined");
    report
}
