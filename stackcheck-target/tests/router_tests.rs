//! Router tests against the in-process axum service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use stackcheck_target::{TargetState, create_router};
use tower::ServiceExt;

async fn get(state: Arc<TargetState>, uri: &str) -> (StatusCode, String) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn state_with_volumes(dir: &std::path::Path) -> Arc<TargetState> {
    Arc::new(TargetState::new(dir, Duration::from_secs(2)).unwrap())
}

#[tokio::test]
async fn test_ping_without_address_returns_pong() {
    // Given: A fresh target service
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    // When: Pinging without an address
    let (status, body) = get(state, "/ping").await;

    // Then: The canonical pong line is returned with a trailing newline
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"response\":\"PONG FROM TARGET\"}\n");
}

#[tokio::test]
async fn test_ping_unreachable_address_returns_bad_request() {
    // Given: An address nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    // When: Asking the service to forward there
    let (status, body) = get(state, &format!("/ping?address={addr}/ping")).await;

    // Then: The unreachable message names the address verbatim
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        format!("{{\"response\":\"Could not reach address: {addr}/ping\"}}\n")
    );
}

#[tokio::test]
async fn test_ping_echoes_address_without_trimming() {
    // Given: An unreachable address with a trailing space
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    // When: Forwarding to it
    let (status, body) = get(state, &format!("/ping?address={addr}/ping%20")).await;

    // Then: The address is echoed exactly as received
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        format!("{{\"response\":\"Could not reach address: {addr}/ping \"}}\n")
    );
}

#[tokio::test]
async fn test_volumefile_returns_file_contents() {
    // Given: A mounted fixture file
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("test_volume.txt"), "MYVOLUME").unwrap();
    let state = state_with_volumes(dir.path());

    // When: Requesting the file
    let (status, body) = get(state, "/volumefile?filename=test_volume.txt").await;

    // Then: Contents are wrapped in the response line
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"response\":\"MYVOLUME\"}\n");
}

#[tokio::test]
async fn test_volumefile_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    let (status, body) = get(state, "/volumefile?filename=absent.txt").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("\"message\""));
}

#[tokio::test]
async fn test_volumefile_rejects_path_traversal() {
    // Given: A secret file next to (not inside) the volumes directory
    let root = tempfile::tempdir().unwrap();
    let volumes = root.path().join("volumes");
    std::fs::create_dir(&volumes).unwrap();
    std::fs::write(root.path().join("secret.txt"), "TOPSECRET").unwrap();
    let state = state_with_volumes(&volumes);

    // When: Requesting it via ..
    let (status, body) = get(state, "/volumefile?filename=../secret.txt").await;

    // Then: The request is refused and nothing leaks
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.contains("TOPSECRET"));
}

#[tokio::test]
async fn test_udp_endpoint_reports_last_value() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    let (_, body) = get(Arc::clone(&state), "/udp").await;
    assert_eq!(body, "{\"response\":\"\"}\n");

    state.set_udp_value("myUdpvalue");
    let (status, body) = get(state, "/udp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"response\":\"myUdpvalue\"}\n");
}

#[tokio::test]
async fn test_scalechecker_counts_distinct_ids() {
    // Given: A fresh target service
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    // When: Three replicas register, one of them twice
    for id in ["replica-1", "replica-2", "replica-1", "replica-3"] {
        get(Arc::clone(&state), &format!("/scalechecker?value={id}")).await;
    }

    // Then: A read-only call reports three distinct ids
    let (status, body) = get(state, "/scalechecker").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{\"response\":\"3\"}\n");
}

#[tokio::test]
async fn test_scalechecker_concurrent_registrations() {
    // Given: Many concurrent requests from three replicas
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    let tasks: Vec<_> = (0..30)
        .map(|i| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                get(state, &format!("/scalechecker?value=replica-{}", i % 3)).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    // Then: Each id is counted exactly once
    assert_eq!(state.scale_count(), 3);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with_volumes(dir.path());

    let (status, _) = get(state, "/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
