use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use stackcheck_core::config::GeneralConfig;
use stackcheck_target::config::TargetConfig;
use stackcheck_target::server::{TargetServer, shutdown_signal};
use stackcheck_target::{logging, metrics_server};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::TargetCli::parse();

    // 로깅 초기화
    logging::init_tracing(&GeneralConfig {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
    })?;

    let mut config = TargetConfig::from_env()?;
    cli.apply(&mut config);

    if let Some(port) = cli.metrics_port {
        metrics_server::install_metrics_recorder(&config.bind_host, port)?;
    }

    let server = TargetServer::bind(&config).await?;
    tracing::info!(
        http_addr = %server.http_addr()?,
        udp_addr = %server.udp_addr()?,
        volumes_dir = %config.volumes_dir.display(),
        "stackcheck-target starting"
    );

    // 종료 시그널 대기
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    server.serve(shutdown).await?;
    Ok(())
}
