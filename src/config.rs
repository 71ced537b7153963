use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You must specify a Shipyard URL")]
    MissingRemoteUrl,

    #[error("Invalid Shipyard URL {url}: {reason}")]
    InvalidRemoteUrl { url: String, reason: String },

    #[error("Invalid Docker endpoint {0:?}")]
    InvalidRuntimeEndpoint(String),

    #[error("Run interval must be greater than zero")]
    ZeroInterval,

    #[error("Invalid external IP {0:?}")]
    InvalidHostIp(String),
}

/// Command line flags, each also readable from the environment
#[derive(Debug, Clone, Parser)]
#[command(name = "shipyard-agent", version, about)]
pub struct Args {
    /// URL to Docker (unix socket path, unix://, tcp:// or http(s)://)
    #[arg(long = "docker", env = "DOCKER_HOST", default_value = "/var/run/docker.sock")]
    pub docker: String,

    /// Shipyard URL
    #[arg(long = "url", env = "SHIPYARD_URL", default_value = "")]
    pub url: String,

    /// Shipyard agent key
    #[arg(long = "key", env = "SHIPYARD_AGENT_KEY", default_value = "")]
    pub key: String,

    /// Run interval (seconds)
    #[arg(long = "interval", env = "SHIPYARD_INTERVAL", default_value_t = 5)]
    pub interval: u64,

    /// Container metrics interval (seconds, 0 disables metrics)
    #[arg(long = "metrics-interval", env = "SHIPYARD_METRICS_INTERVAL", default_value_t = 0)]
    pub metrics_interval: u64,

    /// Docker API version to use
    #[arg(long = "api-version", env = "SHIPYARD_API_VERSION", default_value = "v1.24")]
    pub api_version: String,

    /// Register agent with Shipyard and exit
    #[arg(long = "register", env = "SHIPYARD_REGISTER")]
    pub register: bool,

    /// Agent listen address
    #[arg(long = "address", env = "SHIPYARD_ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// Agent listen port
    #[arg(long = "port", env = "SHIPYARD_PORT", default_value_t = 4500)]
    pub port: u16,

    /// External IP advertised to Shipyard
    #[arg(long = "ip", env = "SHIPYARD_HOST_IP")]
    pub ip: Option<String>,

    /// procfs root (useful for Docker mounts)
    #[arg(long = "proc-path", env = "SHIPYARD_PROC_PATH", default_value = "/proc")]
    pub proc_path: PathBuf,

    #[arg(long = "log-level", env = "SHIPYARD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Where the local Docker daemon listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEndpoint {
    Unix(PathBuf),
    Tcp(Url),
}

impl RuntimeEndpoint {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidRuntimeEndpoint(raw.to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|_| ConfigError::InvalidRuntimeEndpoint(raw.to_string()))?;
            return Ok(Self::Tcp(url));
        }

        if let Some(addr) = raw.strip_prefix("tcp://") {
            let url = Url::parse(&format!("http://{}", addr))
                .map_err(|_| ConfigError::InvalidRuntimeEndpoint(raw.to_string()))?;
            return Ok(Self::Tcp(url));
        }

        let path = raw.strip_prefix("unix://").unwrap_or(raw);
        if path.is_empty() {
            return Err(ConfigError::InvalidRuntimeEndpoint(raw.to_string()));
        }
        Ok(Self::Unix(PathBuf::from(path)))
    }
}

impl std::fmt::Display for RuntimeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(url) => write!(f, "{}", url),
        }
    }
}

/// Application configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub remote_url: String,
    pub agent_key: String,
    pub runtime: RuntimeEndpoint,
    pub api_version: String,
    pub poll_interval: Duration,
    /// `None` disables container metrics
    pub metrics_interval: Option<Duration>,
    pub register: bool,
    pub listen_address: String,
    pub listen_port: u16,
    pub host_ip: Option<IpAddr>,
    pub proc_path: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::try_from(Args::parse())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_address, self.listen_port)
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let remote_url = args.url.trim().trim_end_matches('/').to_string();
        if remote_url.is_empty() {
            return Err(ConfigError::MissingRemoteUrl);
        }
        match Url::parse(&remote_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidRemoteUrl {
                    url: remote_url.clone(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::InvalidRemoteUrl {
                    url: remote_url.clone(),
                    reason: e.to_string(),
                })
            }
        }

        if args.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let host_ip = match args.ip.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(ip) => Some(
                ip.parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidHostIp(ip.to_string()))?,
            ),
        };

        Ok(Self {
            remote_url,
            agent_key: args.key,
            runtime: RuntimeEndpoint::parse(&args.docker)?,
            api_version: args.api_version.trim_matches('/').to_string(),
            poll_interval: Duration::from_secs(args.interval),
            metrics_interval: (args.metrics_interval > 0)
                .then(|| Duration::from_secs(args.metrics_interval)),
            register: args.register,
            listen_address: args.address,
            listen_port: args.port,
            host_ip,
            proc_path: args.proc_path,
            log_level: args.log_level,
        })
    }
}
