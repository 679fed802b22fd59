//! Command-line interface.
//!
//! Values given on the command line (or through their environment
//! variables) override the config file, which overrides the defaults.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::duration::parse_duration;
use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::{read_config, validate_config, ConfigError};

#[derive(Debug, Parser)]
#[command(name = "http-proxy-daemon", version, about = "HTTP forward proxy daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server
    #[command(visible_aliases = ["s", "server"])]
    Serve(ServeArgs),

    /// Display the application version
    #[command(visible_alias = "v")]
    Version,
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// IP address to listen on
    #[arg(short, long, env = "LISTEN_ADDR", value_name = "IP")]
    pub listen: Option<IpAddr>,

    /// TCP port number
    #[arg(short, long, env = "LISTEN_PORT")]
    pub port: Option<u16>,

    /// Proxy route prefix
    #[arg(short = 'x', long, env = "PROXY_PREFIX")]
    pub prefix: Option<String>,

    /// Upstream request timeout (e.g. 15s, 1m30s)
    #[arg(long, env = "PROXY_REQUEST_TIMEOUT", value_parser = parse_duration, value_name = "DURATION")]
    pub proxy_request_timeout: Option<Duration>,

    /// Redirect hops followed before giving up
    #[arg(long)]
    pub max_redirects: Option<usize>,

    /// Log level or tracing filter
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl ServeArgs {
    /// Resolve the effective configuration: file, then overrides, then a
    /// single validation of the merged result.
    pub fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }

    /// Overlay the values given on the command line.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(address) = self.listen {
            config.listener.address = address;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(prefix) = &self.prefix {
            config.proxy.prefix = prefix.clone();
        }
        if let Some(timeout) = self.proxy_request_timeout {
            config.proxy.request_timeout = timeout;
        }
        if let Some(max_redirects) = self.max_redirects {
            config.proxy.max_redirects = max_redirects;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.log_json {
            config.observability.log_format = LogFormat::Json;
        }
    }
}
