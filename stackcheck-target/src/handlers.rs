//! HTTP handlers.
//!
//! Every successful response is `{"response":"<value>"}` followed by a
//! newline, except a forwarded `/ping`, which returns the remote body as-is.

use std::path::{Component, Path, PathBuf};

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use stackcheck_core::metrics as m;

use crate::error::ApiError;
use crate::state::SharedState;

/// Reply to `/ping` without an address.
pub const PONG: &str = "PONG FROM TARGET";

#[derive(Debug, Serialize)]
struct ResponseBody<'a> {
    response: &'a str,
}

/// `{"response":"<content>"}\n` with the given status.
pub fn response_line(status: StatusCode, content: &str) -> Response {
    let mut body = serde_json::to_string(&ResponseBody { response: content })
        .unwrap_or_else(|_| String::from("{}"));
    body.push('\n');
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn count_request(endpoint: &'static str) {
    metrics::counter!(m::TARGET_REQUESTS_TOTAL, m::LABEL_ENDPOINT => endpoint).increment(1);
}

#[derive(Debug, Default, Deserialize)]
pub struct PingQuery {
    #[serde(default)]
    pub address: String,
}

/// `GET /ping?address=<host:port/path>`
pub async fn ping(State(state): State<SharedState>, Query(query): Query<PingQuery>) -> Response {
    count_request("ping");

    let address = query.address.as_str();
    if address.is_empty() {
        return response_line(StatusCode::OK, PONG);
    }

    let url = format!("http://{address}");
    let resp = match state.http().get(&url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(address = address, error = %e, "ping forward failed");
            return response_line(
                StatusCode::BAD_REQUEST,
                &format!("Could not reach address: {address}"),
            );
        }
    };

    match resp.text().await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => response_line(
            StatusCode::BAD_REQUEST,
            &format!("Could not read body from response: {e}"),
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VolumeFileQuery {
    #[serde(default)]
    pub filename: String,
}

/// Resolve `name` under `base`, refusing anything that could leave it.
pub fn resolve_volume_path(base: &Path, name: &str) -> Result<PathBuf, ApiError> {
    if name.is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".to_owned()));
    }
    let relative = Path::new(name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ApiError::BadRequest(format!(
            "filename '{name}' escapes the volumes directory"
        )));
    }
    Ok(base.join(relative))
}

/// `GET /volumefile?filename=<name>`
pub async fn volume_file(
    State(state): State<SharedState>,
    Query(query): Query<VolumeFileQuery>,
) -> Result<Response, ApiError> {
    count_request("volumefile");

    let path = resolve_volume_path(state.volumes_dir(), &query.filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("file '{}' not found", query.filename))
        } else {
            tracing::warn!(path = %path.display(), error = %e, "volume file read failed");
            ApiError::Internal(format!("failed to read '{}': {e}", query.filename))
        }
    })?;

    Ok(response_line(
        StatusCode::OK,
        &String::from_utf8_lossy(&bytes),
    ))
}

/// `GET /udp`
pub async fn udp_value(State(state): State<SharedState>) -> Response {
    count_request("udp");
    response_line(StatusCode::OK, &state.udp_value())
}

#[derive(Debug, Default, Deserialize)]
pub struct ScaleQuery {
    #[serde(default)]
    pub value: String,
}

/// `GET /scalechecker?value=<id>`
pub async fn scale_checker(
    State(state): State<SharedState>,
    Query(query): Query<ScaleQuery>,
) -> Response {
    count_request("scalechecker");
    let count = state.register_scale_id(query.value.trim());
    tracing::debug!(id = %query.value, count = count, "scale checker registration");
    response_line(StatusCode::OK, &count.to_string())
}
