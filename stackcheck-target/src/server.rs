//! Server setup and lifecycle management.
//!
//! [`TargetServer::bind`] opens both listeners up front so callers (and
//! tests using port 0) can read the actual addresses before serving.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;

use crate::config::TargetConfig;
use crate::error::TargetError;
use crate::router::create_router;
use crate::state::{SharedState, TargetState};
use crate::udp::run_udp_receiver;

/// A bound, not yet serving, target service.
pub struct TargetServer {
    http: TcpListener,
    udp: UdpSocket,
    state: SharedState,
}

impl TargetServer {
    /// Validate `config`, create state, and bind both listeners.
    pub async fn bind(config: &TargetConfig) -> Result<Self, TargetError> {
        config.validate()?;

        let http_addr = config.http_addr()?;
        let udp_addr = config.udp_addr()?;

        let http = TcpListener::bind(http_addr)
            .await
            .map_err(|source| TargetError::Bind {
                addr: http_addr.to_string(),
                source,
            })?;
        let udp = UdpSocket::bind(udp_addr)
            .await
            .map_err(|source| TargetError::Bind {
                addr: udp_addr.to_string(),
                source,
            })?;

        let state = Arc::new(TargetState::new(
            config.volumes_dir.clone(),
            config.forward_timeout(),
        )?);

        Ok(Self { http, udp, state })
    }

    /// Bound HTTP address.
    pub fn http_addr(&self) -> Result<SocketAddr, TargetError> {
        Ok(self.http.local_addr()?)
    }

    /// Bound UDP address.
    pub fn udp_addr(&self) -> Result<SocketAddr, TargetError> {
        Ok(self.udp.local_addr()?)
    }

    /// Shared state handle.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Serve HTTP and UDP until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), TargetError> {
        let http_addr = self.http_addr()?;
        let app = create_router(Arc::clone(&self.state));

        let udp_task = tokio::spawn(run_udp_receiver(
            self.udp,
            Arc::clone(&self.state),
            shutdown.child_token(),
        ));

        tracing::info!(listen_addr = %http_addr, "target service listening");

        let token = shutdown.clone();
        let served = axum::serve(self.http, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(|e| TargetError::Server(e.to_string()));

        // The HTTP side may stop on its own; the UDP receiver must follow.
        shutdown.cancel();
        if let Err(e) = udp_task.await {
            tracing::error!(error = %e, "UDP receiver task panicked");
        }

        tracing::info!("target service shut down");
        served
    }
}

/// Resolve once Ctrl+C or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        }
    }
}
