//! 에러 타입 -- 도메인별 에러 정의

/// stackcheck 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StackcheckError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 변형(variant) 디스크립터 / 시나리오 입력 에러
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// 실행(run) 단위 에러
    #[error("run error: {0}")]
    Run(#[from] RunError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 디스크립터 에러 -- 매트릭스 전체를 중단시키는 치명적 입력 오류
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// 디스크립터 파일을 읽거나 파싱하지 못함
    #[error("invalid descriptor {path}: {reason}")]
    Invalid { path: String, reason: String },

    /// 카탈로그 디렉토리에 접근할 수 없음
    #[error("catalog unavailable {path}: {reason}")]
    CatalogUnavailable { path: String, reason: String },
}

/// 단일 실행 단위(run) 에러
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// 외부 lifecycle 명령 실패
    #[error("lifecycle command failed: {0}")]
    Lifecycle(String),

    /// 준비 상태 대기 시간 초과
    #[error("readiness timeout: {0}")]
    ReadinessTimeout(String),

    /// 정리 후 잔여 워크로드 발견
    #[error("residual workload: {0}")]
    ResidualWorkload(String),

    /// 검증 실패
    #[error("verification failed: {0}")]
    Verification(String),
}
