//! Configuration parsing and validation for the relay server
//!
//! Every option can come from the command line or the environment; `main` loads a
//! `.env` file first so local setups can keep settings there.
use anyhow::anyhow;
use clap::Parser;
use nvrelay::{DEFAULT_UPSTREAM_URL, client::PoolConfig};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The address on which the relay will listen.
    #[arg(long, env = "NVRELAY_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "NVRELAY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// The upstream chat endpoint messages are forwarded to.
    #[arg(long, env = "NVIDIA_API_ENDPOINT", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, env = "NVRELAY_METRICS", default_value_t = false)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, env = "NVRELAY_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "nvrelay")]
    pub metrics_prefix: String,

    /// Maximum number of idle connections to keep alive to the upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle upstream connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl Config {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if !matches!(self.upstream_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Upstream URL '{}' must use http or https",
                self.upstream_url
            ));
        }
        if self.metrics && self.metrics_port == self.port {
            return Err(anyhow!(
                "Metrics port {} collides with the relay port",
                self.metrics_port
            ));
        }
        Ok(self)
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
            max_idle_per_host: self.pool_max_idle_per_host,
        }
    }
}
