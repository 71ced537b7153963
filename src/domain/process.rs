use std::path::Path;

use super::ContainerId;

/// Binaries that parent a container's process tree
const LAUNCHERS: &[&str] = &["lxc-start", "containerd-shim"];

/// Point-in-time reading of one host process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSample {
    pub pid: u32,
    pub ppid: u32,
    pub argv: Vec<String>,
    pub cpu_percent: u64,
    pub rss_kb: u64,
}

impl ProcessSample {
    pub fn new(pid: u32, ppid: u32, argv: Vec<String>) -> Self {
        Self {
            pid,
            ppid,
            argv,
            cpu_percent: 0,
            rss_kb: 0,
        }
    }

    pub fn with_usage(mut self, cpu_percent: u64, rss_kb: u64) -> Self {
        self.cpu_percent = cpu_percent;
        self.rss_kb = rss_kb;
        self
    }

    /// Container launched by this process, if it is a container launcher.
    ///
    /// `lxc-start -n <id>` and `containerd-shim* -id <id>` are recognized.
    pub fn launched_container(&self) -> Option<ContainerId> {
        let program = self.argv.first()?;
        let name = Path::new(program).file_name()?.to_str()?;
        let is_launcher = LAUNCHERS
            .iter()
            .any(|l| name == *l || name.starts_with(&format!("{}-", l)));
        if !is_launcher {
            return None;
        }

        self.argv
            .windows(2)
            .find(|pair| matches!(pair[0].as_str(), "-n" | "-id" | "--id"))
            .map(|pair| pair[1].as_str())
            .filter(|id| !id.is_empty())
            .map(ContainerId::from)
    }
}
