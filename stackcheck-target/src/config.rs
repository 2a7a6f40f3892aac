//! Target service configuration.
//!
//! Values come from defaults, then the `HTTP_PORT` environment variable,
//! then command-line flags (applied by the binary).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::TargetError;

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default UDP listen port.
pub const DEFAULT_UDP_PORT: u16 = 10001;

/// Default directory served by `/volumefile`.
pub const DEFAULT_VOLUMES_DIR: &str = "/volumes";

/// Environment variable overriding the HTTP port.
pub const HTTP_PORT_ENV: &str = "HTTP_PORT";

/// Runtime configuration of one target service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Address both listeners bind to.
    pub bind_host: String,
    /// HTTP listen port (0 picks an ephemeral port).
    pub http_port: u16,
    /// UDP listen port (0 picks an ephemeral port).
    pub udp_port: u16,
    /// Base directory for `/volumefile`.
    pub volumes_dir: PathBuf,
    /// Timeout for `/ping` forwarding requests.
    pub forward_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_owned(),
            http_port: DEFAULT_HTTP_PORT,
            udp_port: DEFAULT_UDP_PORT,
            volumes_dir: PathBuf::from(DEFAULT_VOLUMES_DIR),
            forward_timeout_secs: 10,
        }
    }
}

impl TargetConfig {
    /// Defaults with `HTTP_PORT` applied.
    ///
    /// An empty `HTTP_PORT` is ignored; an unparsable one is an error.
    pub fn from_env() -> Result<Self, TargetError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(HTTP_PORT_ENV) {
            let raw = raw.trim();
            if !raw.is_empty() {
                config.http_port = raw.parse().map_err(|e| TargetError::Config {
                    field: HTTP_PORT_ENV.to_owned(),
                    reason: format!("'{raw}' is not a valid port: {e}"),
                })?;
            }
        }
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), TargetError> {
        if self.forward_timeout_secs == 0 {
            return Err(TargetError::Config {
                field: "forward_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.http_port != 0 && self.http_port == self.udp_port {
            tracing::warn!(port = self.http_port, "HTTP and UDP ports are identical");
        }
        self.http_addr()?;
        Ok(())
    }

    /// HTTP listen address.
    pub fn http_addr(&self) -> Result<SocketAddr, TargetError> {
        parse_addr(&self.bind_host, self.http_port, "http_port")
    }

    /// UDP listen address.
    pub fn udp_addr(&self) -> Result<SocketAddr, TargetError> {
        parse_addr(&self.bind_host, self.udp_port, "udp_port")
    }

    /// `/ping` forwarding timeout.
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

fn parse_addr(host: &str, port: u16, field: &str) -> Result<SocketAddr, TargetError> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| TargetError::Config {
            field: field.to_owned(),
            reason: format!("invalid listen address {host}:{port}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixture_ports() {
        let config = TargetConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.udp_port, 10001);
        assert_eq!(config.volumes_dir, PathBuf::from("/volumes"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_bind_host_is_rejected() {
        let config = TargetConfig {
            bind_host: "999.1.1.1".to_owned(),
            ..TargetConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TargetError::Config { .. })
        ));
    }

    #[test]
    fn zero_forward_timeout_is_rejected() {
        let config = TargetConfig {
            forward_timeout_secs: 0,
            ..TargetConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
