//! 타겟 서비스 프로브 클라이언트
//!
//! 검증 콜백이 살아 있는 워크로드를 관찰하는 유일한 통로입니다.
//! HTTP 본문은 상태 코드와 무관하게 그대로 반환되므로 (예: `/ping`의
//! 400 응답) 정확한 문자열 비교에 사용할 수 있습니다.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stackcheck_core::TargetEndpointConfig;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::HarnessError;

/// 프로브 요청 기본 제한 시간
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 타겟 서비스 응답 본문 `{"response": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// 응답 값
    pub response: String,
}

/// UDP 데이터그램 본문 `{"request": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    /// 저장할 값
    pub request: String,
}

/// 타겟 서비스가 반환하는 정확한 본문을 만듭니다 (끝의 개행 포함).
pub fn json_response(content: &str) -> String {
    let body = ProbeResponse {
        response: content.to_owned(),
    };
    // String 필드 하나짜리 구조체는 직렬화에 실패하지 않습니다.
    let encoded = serde_json::to_string(&body).unwrap_or_default();
    format!("{encoded}\n")
}

/// 응답 본문을 [`ProbeResponse`]로 파싱합니다.
pub fn parse_response(body: &str) -> Result<ProbeResponse, HarnessError> {
    serde_json::from_str(body.trim_end())
        .map_err(|e| HarnessError::Probe(format!("malformed response body {body:?}: {e}")))
}

async fn resolve_udp_addr(host: &str, port: u16) -> Result<SocketAddr, HarnessError> {
    let unresolved = |reason: String| HarnessError::Config {
        field: "target.host".to_owned(),
        reason,
    };
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| unresolved(format!("failed to resolve {host}:{port}: {e}")))?;
    addrs
        .next()
        .ok_or_else(|| unresolved(format!("{host}:{port} resolved to no address")))
}

/// 타겟 서비스 HTTP / UDP 클라이언트
#[derive(Debug, Clone)]
pub struct TargetClient {
    client: reqwest::Client,
    base_url: String,
    udp_addr: SocketAddr,
}

impl TargetClient {
    /// 기본 URL(`http://host:port`)과 UDP 주소로 클라이언트를 생성합니다.
    pub fn new(base_url: impl Into<String>, udp_addr: SocketAddr) -> Result<Self, HarnessError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_PROBE_TIMEOUT)
            .build()
            .map_err(|e| HarnessError::Probe(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            udp_addr,
        })
    }

    /// `[target]` 설정에서 클라이언트를 생성합니다.
    ///
    /// `host`는 IP 리터럴 또는 호스트 이름이며, UDP 주소는 여기서 한 번 해석합니다.
    /// 해석에 실패하면 `target.host` 설정 에러를 반환합니다.
    pub async fn from_config(config: &TargetEndpointConfig) -> Result<Self, HarnessError> {
        let udp_addr = resolve_udp_addr(&config.host, config.udp_port).await?;
        Self::new(format!("http://{}:{}", config.host, config.http_port), udp_addr)
    }

    /// HTTP 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// UDP 수신 주소
    pub fn udp_addr(&self) -> SocketAddr {
        self.udp_addr
    }

    /// `GET <base><path_and_query>`의 본문을 그대로 반환합니다.
    pub async fn get_body(&self, path_and_query: &str) -> Result<String, HarnessError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HarnessError::Probe(format!("GET {url} failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HarnessError::Probe(format!("failed to read body of {url}: {e}")))?;
        debug!(url = %url, status = %status, bytes = body.len(), "probe response");
        Ok(body)
    }

    /// `/ping?address=<address>`
    pub async fn ping(&self, address: &str) -> Result<String, HarnessError> {
        self.get_body(&format!("/ping?address={address}")).await
    }

    /// `/volumefile?filename=<name>`
    pub async fn volume_file(&self, name: &str) -> Result<String, HarnessError> {
        self.get_body(&format!("/volumefile?filename={name}")).await
    }

    /// `/udp`
    pub async fn udp_value(&self) -> Result<String, HarnessError> {
        self.get_body("/udp").await
    }

    /// `/scalechecker` 응답의 `response` 필드
    pub async fn scale_count(&self) -> Result<String, HarnessError> {
        let body = self.get_body("/scalechecker").await?;
        Ok(parse_response(&body)?.response)
    }

    /// `{"request": value}` 데이터그램 하나를 UDP 수신기로 보냅니다.
    pub async fn send_udp(&self, value: &str) -> Result<(), HarnessError> {
        let bind_addr: SocketAddr = if self.udp_addr.is_ipv6() {
            SocketAddr::from(([0u16; 8], 0))
        } else {
            SocketAddr::from(([0u8; 4], 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;

        let payload = serde_json::to_vec(&ProbeRequest {
            request: value.to_owned(),
        })
        .map_err(|e| HarnessError::Probe(format!("failed to encode datagram: {e}")))?;

        let sent = socket.send_to(&payload, self.udp_addr).await?;
        debug!(addr = %self.udp_addr, bytes = sent, "sent UDP probe");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_has_trailing_newline() {
        assert_eq!(
            json_response("PONG FROM TARGET"),
            "{\"response\":\"PONG FROM TARGET\"}\n"
        );
    }

    #[test]
    fn json_response_escapes_quotes() {
        assert_eq!(json_response("a\"b"), "{\"response\":\"a\\\"b\"}\n");
    }

    #[test]
    fn parse_response_accepts_trailing_newline() {
        let parsed = parse_response("{\"response\":\"3\"}\n").unwrap();
        assert_eq!(parsed.response, "3");
    }

    #[test]
    fn parse_response_rejects_garbage() {
        assert!(matches!(
            parse_response("Could not reach"),
            Err(HarnessError::Probe(_))
        ));
    }

    #[tokio::test]
    async fn from_config_builds_addresses() {
        let client = TargetClient::from_config(&TargetEndpointConfig::default())
            .await
            .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
        assert_eq!(client.udp_addr(), "127.0.0.1:10001".parse().unwrap());
    }

    #[tokio::test]
    async fn from_config_resolves_host_names() {
        // Given: IP 리터럴이 아닌 호스트 이름
        let config = TargetEndpointConfig {
            host: "localhost".to_owned(),
            ..TargetEndpointConfig::default()
        };

        // When: 클라이언트를 생성
        let client = TargetClient::from_config(&config).await.unwrap();

        // Then: HTTP URL은 이름을 유지하고 UDP 주소는 루프백으로 해석된다
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert!(client.udp_addr().ip().is_loopback());
        assert_eq!(client.udp_addr().port(), config.udp_port);
    }

    #[tokio::test]
    async fn send_udp_writes_request_payload() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();
        let client = TargetClient::new("http://127.0.0.1:1", addr).unwrap();

        client.send_udp("myUdpvalue").await.unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], br#"{"request":"myUdpvalue"}"#);
    }
}
