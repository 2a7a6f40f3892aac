//! End-to-end tests against bound target service instances.

use std::net::SocketAddr;
use std::time::Duration;

use serial_test::serial;
use stackcheck_target::config::{HTTP_PORT_ENV, TargetConfig};
use stackcheck_target::{TargetError, TargetServer};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

fn ephemeral_config(volumes: &std::path::Path) -> TargetConfig {
    TargetConfig {
        bind_host: "127.0.0.1".to_owned(),
        http_port: 0,
        udp_port: 0,
        volumes_dir: volumes.to_path_buf(),
        forward_timeout_secs: 2,
    }
}

struct Running {
    http: SocketAddr,
    udp: SocketAddr,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), TargetError>>,
}

async fn start(volumes: &std::path::Path) -> Running {
    let server = TargetServer::bind(&ephemeral_config(volumes)).await.unwrap();
    let http = server.http_addr().unwrap();
    let udp = server.udp_addr().unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server.serve(shutdown.clone()));
    Running {
        http,
        udp,
        shutdown,
        handle,
    }
}

async fn body(url: &str) -> String {
    reqwest::get(url).await.unwrap().text().await.unwrap()
}

#[tokio::test]
async fn test_ping_forwards_remote_body_verbatim() {
    // Given: Two target services on the same host
    let dir = tempfile::tempdir().unwrap();
    let a = start(dir.path()).await;
    let b = start(dir.path()).await;

    // When: A is asked to ping B
    let resp = reqwest::get(format!("http://{}/ping?address={}/ping", a.http, b.http))
        .await
        .unwrap();

    // Then: A returns B's own pong with 200
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.text().await.unwrap(),
        "{\"response\":\"PONG FROM TARGET\"}\n"
    );

    a.shutdown.cancel();
    b.shutdown.cancel();
}

#[tokio::test]
async fn test_udp_datagram_round_trip() {
    // Given: A running service
    let dir = tempfile::tempdir().unwrap();
    let running = start(dir.path()).await;
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // When: A malformed datagram is followed by a valid one
    sender.send_to(b"garbage", running.udp).await.unwrap();
    sender
        .send_to(br#"{"request":"myUdpvalue"}"#, running.udp)
        .await
        .unwrap();

    // Then: The receiver survives and /udp reports the valid value
    let url = format!("http://{}/udp", running.http);
    let mut last = String::new();
    for _ in 0..50 {
        last = body(&url).await;
        if last.contains("myUdpvalue") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(last, "{\"response\":\"myUdpvalue\"}\n");

    running.shutdown.cancel();
}

#[tokio::test]
async fn test_serve_stops_on_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let running = start(dir.path()).await;

    running.shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = TargetConfig {
        http_port: taken.local_addr().unwrap().port(),
        ..ephemeral_config(dir.path())
    };

    let result = TargetServer::bind(&config).await;
    assert!(matches!(result, Err(TargetError::Bind { .. })));
}

#[test]
#[serial]
fn test_http_port_env_override() {
    // SAFETY: serialized with other env-mutating tests
    unsafe { std::env::set_var(HTTP_PORT_ENV, "9191") };
    let config = TargetConfig::from_env().unwrap();
    unsafe { std::env::remove_var(HTTP_PORT_ENV) };

    assert_eq!(config.http_port, 9191);
    assert_eq!(config.udp_port, 10001);
}

#[test]
#[serial]
fn test_invalid_http_port_env_is_error() {
    // SAFETY: serialized with other env-mutating tests
    unsafe { std::env::set_var(HTTP_PORT_ENV, "not-a-port") };
    let result = TargetConfig::from_env();
    unsafe { std::env::remove_var(HTTP_PORT_ENV) };

    assert!(matches!(result, Err(TargetError::Config { .. })));
}

#[test]
#[serial]
fn test_missing_http_port_env_uses_default() {
    // SAFETY: serialized with other env-mutating tests
    unsafe { std::env::remove_var(HTTP_PORT_ENV) };
    assert_eq!(TargetConfig::from_env().unwrap().http_port, 8080);
}
