//! UDP receiver.
//!
//! Each datagram is one `{"request":"<value>"}` object. The value replaces
//! the state's last UDP value. Malformed datagrams are logged and dropped.

use serde::Deserialize;
use stackcheck_core::metrics as m;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::state::SharedState;

/// Largest datagram accepted.
const MAX_DATAGRAM_SIZE: usize = 65535;

#[derive(Debug, Deserialize)]
struct UdpRequest {
    request: String,
}

/// Extract the request value from a datagram payload.
pub fn parse_datagram(payload: &[u8]) -> Result<String, serde_json::Error> {
    serde_json::from_slice::<UdpRequest>(payload).map(|r| r.request)
}

/// Receive datagrams until `cancel` fires.
pub async fn run_udp_receiver(socket: UdpSocket, state: SharedState, cancel: CancellationToken) {
    let local = socket
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_owned());
    tracing::info!(listen_addr = %local, "UDP receiver started");

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => {
                let (n, peer) = match received {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "UDP receive failed");
                        continue;
                    }
                };
                metrics::counter!(m::TARGET_UDP_DATAGRAMS_TOTAL).increment(1);

                match parse_datagram(&buf[..n]) {
                    Ok(value) => {
                        tracing::debug!(peer = %peer, value = %value, "UDP value stored");
                        state.set_udp_value(value);
                    }
                    Err(e) => {
                        tracing::warn!(peer = %peer, bytes = n, error = %e, "ignoring malformed datagram");
                    }
                }
            }
        }
    }

    tracing::info!(listen_addr = %local, "UDP receiver stopped");
}
