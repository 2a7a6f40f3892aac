//! CLI argument definitions for the target service.
//!
//! Flags take precedence over the `HTTP_PORT` environment variable, which
//! takes precedence over built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use stackcheck_target::config::TargetConfig;

/// Fixture HTTP/UDP service queried by compliance checks.
#[derive(Parser, Debug)]
#[command(name = "stackcheck-target")]
#[command(version, about, long_about = None)]
pub struct TargetCli {
    /// Address both listeners bind to.
    #[arg(long)]
    pub bind: Option<String>,

    /// HTTP listen port (overrides HTTP_PORT).
    #[arg(long)]
    pub http_port: Option<u16>,

    /// UDP listen port.
    #[arg(long)]
    pub udp_port: Option<u16>,

    /// Directory served by /volumefile.
    #[arg(long)]
    pub volumes_dir: Option<PathBuf>,

    /// Timeout in seconds for /ping forwarding.
    #[arg(long)]
    pub forward_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (json, pretty).
    #[arg(long, default_value = "json")]
    pub log_format: String,

    /// Expose Prometheus metrics on this port.
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

impl TargetCli {
    /// Apply flag overrides on top of `config`.
    pub fn apply(&self, config: &mut TargetConfig) {
        if let Some(bind) = &self.bind {
            config.bind_host = bind.clone();
        }
        if let Some(port) = self.http_port {
            config.http_port = port;
        }
        if let Some(port) = self.udp_port {
            config.udp_port = port;
        }
        if let Some(dir) = &self.volumes_dir {
            config.volumes_dir = dir.clone();
        }
        if let Some(secs) = self.forward_timeout_secs {
            config.forward_timeout_secs = secs;
        }
    }
}
