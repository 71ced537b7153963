use thiserror::Error;

use crate::ports::ProcessError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}

impl From<ParseError> for ProcessError {
    fn from(err: ParseError) -> Self {
        ProcessError::Parse(err.to_string())
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse /proc/uptime
pub fn parse_uptime(content: &str) -> ParseResult<u64> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.is_empty() {
        return Err(ParseError::Parse("Empty uptime file".to_string()));
    }

    let uptime_secs = parts[0]
        .parse::<f64>()
        .map_err(|e| ParseError::Parse(format!("Invalid uptime value: {}", e)))?;

    Ok(uptime_secs as u64)
}

/// Fields of /proc/{pid}/stat used for usage accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub ppid: u32,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    /// Clock ticks after boot
    pub starttime: u64,
}

impl ProcStat {
    /// Scheduler ticks of the process and its waited-for children
    pub fn total_ticks(&self) -> u64 {
        self.utime + self.stime + self.cutime + self.cstime
    }
}

/// Parse /proc/{pid}/stat
pub fn parse_proc_stat(content: &str) -> ParseResult<ProcStat> {
    // Format: pid (comm) state ppid ... utime stime cutime cstime ... starttime
    // comm may itself contain spaces and parentheses

    let start = content.find('(').ok_or_else(|| ParseError::Parse("No ( found".to_string()))?;
    let end = content.rfind(')').ok_or_else(|| ParseError::Parse("No ) found".to_string()))?;

    let pid_str = content[..start].trim();
    let after_comm = &content[end + 1..];

    let parts: Vec<&str> = after_comm.split_whitespace().collect();
    if parts.len() < 20 {
        return Err(ParseError::Parse("Incomplete proc stat".to_string()));
    }

    let field = |idx: usize, name: &str| -> ParseResult<u64> {
        parts[idx]
            .parse()
            .map_err(|e| ParseError::Parse(format!("{}: {}", name, e)))
    };

    Ok(ProcStat {
        pid: pid_str.parse().map_err(|e| ParseError::Parse(format!("pid: {}", e)))?,
        ppid: parts[1].parse().map_err(|e| ParseError::Parse(format!("ppid: {}", e)))?,
        utime: field(11, "utime")?,
        stime: field(12, "stime")?,
        cutime: field(13, "cutime")?,
        cstime: field(14, "cstime")?,
        starttime: field(19, "starttime")?,
    })
}

/// Resident set size in kB from /proc/{pid}/status.
///
/// Kernel threads have no `VmRSS` line and report 0.
pub fn parse_vm_rss(content: &str) -> ParseResult<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let value = rest
                .split_whitespace()
                .next()
                .ok_or_else(|| ParseError::MissingField("VmRSS value".to_string()))?;
            return value
                .parse()
                .map_err(|e| ParseError::Parse(format!("VmRSS: {}", e)));
        }
    }
    Ok(0)
}

/// Split /proc/{pid}/cmdline into its arguments
pub fn parse_cmdline(content: &str) -> Vec<String> {
    content
        .split('\0')
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}
