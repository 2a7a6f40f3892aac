//! Readiness gate -- 헬스 체크 엔드포인트 폴링
//!
//! 게이트는 고정 간격으로 폴링하면서 매 반복마다 데드라인을 확인합니다.
//! 연결 에러는 전파하지 않고 준비 여부만 호출자에게 보입니다.

use std::time::Duration;

use stackcheck_core::metrics as m;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::HarnessError;

/// 기본 폴링 간격
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 고정 간격 헬스 체크 폴러
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl ReadinessGate {
    /// 새 게이트를 생성합니다.
    ///
    /// `poll_interval`이 0이면 [`DEFAULT_POLL_INTERVAL`]을 사용합니다.
    pub fn new(poll_interval: Duration) -> Result<Self, HarnessError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HarnessError::Probe(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, poll_interval))
    }

    /// 이미 구성된 HTTP 클라이언트로 게이트를 생성합니다.
    pub fn with_client(client: reqwest::Client, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        Self {
            client,
            poll_interval,
        }
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// `url`이 성공 상태를 반환하거나 `timeout`이 지날 때까지 기다립니다.
    ///
    /// 준비되면 `true`, 데드라인을 넘기면 `false`를 반환합니다.
    pub async fn await_ready(&self, url: &str, timeout: Duration) -> bool {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempts: u32 = 0;

        let ready = loop {
            let now = Instant::now();
            if now >= deadline {
                break false;
            }
            attempts += 1;

            // 시도 하나도 남은 시간 안에 끝나야 합니다.
            let remaining = deadline - now;
            match self.client.get(url).timeout(remaining).send().await {
                Ok(resp) if resp.status().is_success() => break true,
                Ok(resp) => {
                    trace!(url = url, status = %resp.status(), attempt = attempts, "target not ready");
                }
                Err(e) => {
                    trace!(url = url, error = %e, attempt = attempts, "target unreachable");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break false;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        };

        let waited = started.elapsed();
        metrics::histogram!(m::READINESS_WAIT_SECONDS).record(waited.as_secs_f64());
        debug!(
            url = url,
            ready = ready,
            attempts = attempts,
            waited_ms = waited.as_millis() as u64,
            "readiness gate finished"
        );

        ready
    }
}
