//! 하네스 에러 타입
//!
//! [`HarnessError`]는 매트릭스 실행 중 발생하는 모든 에러를 표현합니다.
//! `From<HarnessError> for StackcheckError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! # 전파 범위
//!
//! - `Descriptor`, `Catalog`, `Config`: 매트릭스 시작 전에 발생하며 매트릭스 전체를 중단합니다.
//! - 그 외: 현재 실행(run)에만 영향을 주고, 다음 실행은 계속 진행됩니다.

use std::time::Duration;

use stackcheck_core::error::{ConfigError, DescriptorError, RunError, StackcheckError};

/// 하네스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 변형 디스크립터 파싱 / 검증 실패
    #[error("descriptor error: {path}: {reason}")]
    Descriptor {
        /// 디스크립터 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 카탈로그 디렉토리 접근 실패 또는 존재하지 않는 시나리오
    #[error("catalog error: {path}: {reason}")]
    Catalog {
        /// 디렉토리 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 외부 lifecycle 명령이 0이 아닌 코드로 종료했거나 실행되지 못함
    #[error("lifecycle '{verb}' failed for variant '{variant}' ({status})")]
    Lifecycle {
        /// 변형 이름
        variant: String,
        /// 동사 (up, down, list)
        verb: String,
        /// 종료 상태 설명 ("exit code 1", "spawn failed: ..." 등)
        status: String,
        /// 수집된 표준 출력
        stdout: String,
        /// 수집된 표준 에러
        stderr: String,
    },

    /// 외부 lifecycle 명령이 제한 시간 내에 끝나지 않음
    #[error("lifecycle '{verb}' for variant '{variant}' did not exit within {timeout:?}")]
    LifecycleTimeout {
        /// 변형 이름
        variant: String,
        /// 동사
        verb: String,
        /// 적용된 제한 시간
        timeout: Duration,
    },

    /// 헬스 체크 엔드포인트가 제한 시간 내에 준비되지 않음
    #[error("target at {url} not ready within {timeout:?}")]
    ReadinessTimeout {
        /// 헬스 체크 URL
        url: String,
        /// 대기 상한
        timeout: Duration,
    },

    /// down 이후에도 워크로드 유닛이 남아 있음
    #[error("variant '{variant}' left {count} workload unit(s) after teardown")]
    ResidualWorkload {
        /// 변형 이름 (책임 귀속 대상)
        variant: String,
        /// 남은 유닛 수
        count: usize,
        /// 목록 명령의 원본 출력
        listing: String,
    },

    /// 검증 콜백의 치명적 실패 (실행을 즉시 중단)
    #[error("verification aborted: {0}")]
    Verification(String),

    /// 설정 값으로 실행 환경을 구성할 수 없음 (예: 타겟 호스트 해석 실패)
    #[error("invalid config value for '{field}': {reason}")]
    Config {
        /// 설정 필드 (`target.host` 등)
        field: String,
        /// 실패 사유
        reason: String,
    },

    /// 타겟 서비스 프로브 실패
    #[error("probe error: {0}")]
    Probe(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// 매트릭스 전체를 중단해야 하는 에러인지 여부
    pub fn is_fatal_for_matrix(&self) -> bool {
        matches!(
            self,
            Self::Descriptor { .. } | Self::Catalog { .. } | Self::Config { .. }
        )
    }
}

impl From<HarnessError> for StackcheckError {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::Descriptor { path, reason } => {
                StackcheckError::Descriptor(DescriptorError::Invalid { path, reason })
            }
            HarnessError::Catalog { path, reason } => {
                StackcheckError::Descriptor(DescriptorError::CatalogUnavailable { path, reason })
            }
            HarnessError::Config { field, reason } => {
                StackcheckError::Config(ConfigError::InvalidValue { field, reason })
            }
            HarnessError::Io(e) => StackcheckError::Io(e),
            err @ (HarnessError::Lifecycle { .. } | HarnessError::LifecycleTimeout { .. }) => {
                StackcheckError::Run(RunError::Lifecycle(err.to_string()))
            }
            err @ HarnessError::ReadinessTimeout { .. } => {
                StackcheckError::Run(RunError::ReadinessTimeout(err.to_string()))
            }
            err @ HarnessError::ResidualWorkload { .. } => {
                StackcheckError::Run(RunError::ResidualWorkload(err.to_string()))
            }
            err @ (HarnessError::Verification(_) | HarnessError::Probe(_)) => {
                StackcheckError::Run(RunError::Verification(err.to_string()))
            }
        }
    }
}
