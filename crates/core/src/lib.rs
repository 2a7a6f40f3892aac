//! stackcheck 공통 크레이트
//!
//! 하네스, 타겟 서비스, CLI가 공유하는 에러 분류, 설정, 메트릭 이름을 제공합니다.
//!
//! - [`error`]: 최상위 에러 ([`StackcheckError`])와 도메인 에러
//! - [`config`]: `stackcheck.toml` 설정 ([`StackcheckConfig`])
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DescriptorError, RunError, StackcheckError};

// 설정
pub use config::{GeneralConfig, HarnessConfig, StackcheckConfig, TargetEndpointConfig};
