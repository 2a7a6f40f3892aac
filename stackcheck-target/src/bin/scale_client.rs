//! Scale-checker replica.
//!
//! Each replica of the scaling scenario runs this once: wait, then register
//! its own hostname with the target service and exit.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

/// Register this replica with the target service's scale checker.
#[derive(Parser, Debug)]
#[command(name = "stackcheck-scale-client")]
#[command(version, about, long_about = None)]
struct ScaleClientCli {
    /// Target service `host:port`.
    #[arg(long, default_value = "server:8080")]
    target: String,

    /// Delay before registering, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Identifier to register (defaults to $HOSTNAME).
    #[arg(long)]
    value: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();

    let cli = ScaleClientCli::parse();
    let value = match cli.value {
        Some(v) => v,
        None => std::env::var("HOSTNAME").context("HOSTNAME is not set and --value not given")?,
    };

    tokio::time::sleep(Duration::from_millis(cli.delay_ms)).await;

    let url = format!("http://{}/scalechecker?value={}", cli.target, value);
    let resp = reqwest::get(&url)
        .await
        .with_context(|| format!("GET {url} failed"))?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("scale checker returned {status}");
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::info!(value = %value, response = %body.trim_end(), "registered with scale checker");
    Ok(())
}
