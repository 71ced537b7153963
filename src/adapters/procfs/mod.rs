mod parser;
mod process;

use std::path::PathBuf;

pub use process::{container_metrics, cpu_percent, ProcfsProcessSource};

/// Fallback when the kernel tick rate cannot be queried
const DEFAULT_CLOCK_TICKS: u64 = 100;

/// Configuration for procfs access (useful for Docker mounts)
#[derive(Debug, Clone)]
pub struct ProcfsConfig {
    pub proc_path: PathBuf,
    /// Scheduler clock ticks per second (USER_HZ)
    pub clock_ticks: u64,
}

impl ProcfsConfig {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            clock_ticks: host_clock_ticks(),
        }
    }

    pub fn with_clock_ticks(mut self, clock_ticks: u64) -> Self {
        self.clock_ticks = clock_ticks;
        self
    }
}

fn host_clock_ticks() -> u64 {
    match nix::unistd::sysconf(nix::unistd::SysconfVar::CLK_TCK) {
        Ok(Some(ticks)) if ticks > 0 => ticks as u64,
        _ => DEFAULT_CLOCK_TICKS,
    }
}
