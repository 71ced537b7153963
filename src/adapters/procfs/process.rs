use std::collections::{HashMap, HashSet};
use std::fs;

use async_trait::async_trait;

use crate::domain::{ContainerId, ContainerMetric, ProcessSample};
use crate::ports::{ProcessError, ProcessSource};

use super::parser;
use super::ProcfsConfig;

/// CPU usage in percent over the lifetime of a process.
///
/// `ticks` and `start_ticks` are in clock ticks, `uptime_secs` is the host
/// uptime. A process younger than one second reports 0.
pub fn cpu_percent(ticks: u64, start_ticks: u64, uptime_secs: u64, hertz: u64) -> u64 {
    let hertz = hertz.max(1);
    let elapsed = uptime_secs.saturating_sub(start_ticks / hertz);
    if elapsed == 0 {
        return 0;
    }
    100u64.saturating_mul(ticks / hertz) / elapsed
}

/// Sum usage of every container's process tree.
///
/// A container's tree is everything below its launcher process, found by
/// following parent pids. The launcher itself is not counted.
pub fn container_metrics(samples: &[ProcessSample]) -> Vec<ContainerMetric> {
    let mut children: HashMap<u32, Vec<&ProcessSample>> = HashMap::new();
    for sample in samples {
        children.entry(sample.ppid).or_default().push(sample);
    }

    let mut totals: HashMap<ContainerId, (u64, u64)> = HashMap::new();
    for launcher in samples {
        let Some(container_id) = launcher.launched_container() else {
            continue;
        };

        let entry = totals.entry(container_id).or_insert((0, 0));
        let mut seen = HashSet::from([launcher.pid]);
        let mut pending = vec![launcher.pid];
        while let Some(pid) = pending.pop() {
            for child in children.get(&pid).into_iter().flatten() {
                if !seen.insert(child.pid) {
                    continue;
                }
                entry.0 = entry.0.saturating_add(child.cpu_percent);
                entry.1 = entry.1.saturating_add(child.rss_kb);
                pending.push(child.pid);
            }
        }
    }

    let mut metrics: Vec<ContainerMetric> = totals
        .into_iter()
        .map(|(id, (cpu, mem))| ContainerMetric::new(id, cpu, mem))
        .collect();
    metrics.sort_by(|a, b| a.container_id.cmp(&b.container_id));
    metrics
}

/// Process source implementation using procfs
#[derive(Debug, Clone)]
pub struct ProcfsProcessSource {
    config: ProcfsConfig,
}

impl ProcfsProcessSource {
    pub fn new(config: ProcfsConfig) -> Self {
        Self { config }
    }

    fn list_pids(&self) -> Result<Vec<u32>, ProcessError> {
        let mut pids = Vec::new();

        for entry in fs::read_dir(&self.config.proc_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if let Ok(pid) = name.parse::<u32>() {
                pids.push(pid);
            }
        }

        Ok(pids)
    }

    fn read_process(&self, pid: u32, uptime_secs: u64) -> Result<ProcessSample, ProcessError> {
        let pid_path = self.config.proc_path.join(pid.to_string());

        let stat = parser::parse_proc_stat(&fs::read_to_string(pid_path.join("stat"))?)?;
        let rss_kb = parser::parse_vm_rss(&fs::read_to_string(pid_path.join("status"))?)?;
        let argv = parser::parse_cmdline(&fs::read_to_string(pid_path.join("cmdline")).unwrap_or_default());

        let cpu = cpu_percent(stat.total_ticks(), stat.starttime, uptime_secs, self.config.clock_ticks);

        Ok(ProcessSample::new(stat.pid, stat.ppid, argv).with_usage(cpu, rss_kb))
    }

    fn scan(&self) -> Result<Vec<ProcessSample>, ProcessError> {
        let uptime_content = fs::read_to_string(self.config.proc_path.join("uptime"))?;
        let uptime_secs = parser::parse_uptime(&uptime_content)?;

        let mut processes = Vec::new();
        for pid in self.list_pids()? {
            // Processes may exit between readdir and read
            if let Ok(process) = self.read_process(pid, uptime_secs) {
                processes.push(process);
            }
        }

        Ok(processes)
    }
}

#[async_trait]
impl ProcessSource for ProcfsProcessSource {
    async fn list_processes(&self) -> Result<Vec<ProcessSample>, ProcessError> {
        // A full /proc walk is blocking file IO
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.scan()).await?
    }
}
