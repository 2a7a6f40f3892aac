//! Logging initialization for the `stackcheck` binary.
//!
//! Logs always go to stderr so stdout carries only the rendered report.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use stackcheck_core::config::GeneralConfig;

use crate::error::CliError;

/// Pick the filter directive: `--log-level`, then `RUST_LOG`, then the config file.
///
/// An empty value counts as unset.
pub fn resolve_filter(
    cli_level: Option<&str>,
    env_level: Option<&str>,
    config_level: &str,
) -> String {
    [cli_level, env_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|level| !level.is_empty())
        .unwrap_or(config_level)
        .to_owned()
}

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - JSON lines on stderr
/// * `"pretty"` - Human-readable output on stderr
pub fn init_tracing(cli_level: Option<&str>, config: &GeneralConfig) -> Result<(), CliError> {
    let env_level = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter(cli_level, env_level.as_deref(), &config.log_level);
    let env_filter = EnvFilter::new(directive);

    match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize JSON tracing subscriber: {e}"))
            }),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                CliError::Config(format!("failed to initialize tracing subscriber: {e}"))
            }),
        other => Err(CliError::Config(format!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        ))),
    }
}
