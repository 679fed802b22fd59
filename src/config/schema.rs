//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::proxy::client::ClientConfig;

/// Root configuration for the proxy daemon.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address and port).
    pub listener: ListenerConfig,

    /// Forwarding behaviour.
    pub proxy: ProxySettings,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to listen on.
    pub address: IpAddr,

    /// TCP port number.
    pub port: u16,
}

impl ListenerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Route prefix, e.g. `proxy` serves `/proxy/<target>`.
    pub prefix: String,

    /// Overall upstream request timeout (e.g. "30s", "1m30s").
    #[serde(with = "crate::config::duration")]
    pub request_timeout: Duration,

    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
}

impl ProxySettings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            max_redirects: self.max_redirects,
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            prefix: "proxy".to_string(),
            request_timeout: Duration::from_secs(30),
            max_redirects: 2,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish after a stop signal.
    #[serde(with = "crate::config::duration")]
    pub grace_period: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(5),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProxyConfig::default();

        assert_eq!(config.listener.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.proxy.prefix, "proxy");
        assert_eq!(config.proxy.request_timeout, Duration::from_secs(30));
        assert_eq!(config.proxy.max_redirects, 2);
        assert_eq!(config.shutdown.grace_period, Duration::from_secs(5));
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 9000

            [proxy]
            prefix = "fetch"
            request_timeout = "1m30s"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.proxy.prefix, "fetch");
        assert_eq!(config.proxy.request_timeout, Duration::from_secs(90));
        assert_eq!(config.proxy.max_redirects, 2);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.shutdown, ShutdownConfig::default());
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = ProxyConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ProxyConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed, config);
        assert!(text.contains("request_timeout = \"30s\""));
    }

    #[test]
    fn client_config_from_settings() {
        let settings = ProxySettings {
            request_timeout: Duration::from_secs(3),
            max_redirects: 5,
            ..ProxySettings::default()
        };

        let client = settings.client_config();
        assert_eq!(client.request_timeout, Duration::from_secs(3));
        assert_eq!(client.max_redirects, 5);
    }
}
