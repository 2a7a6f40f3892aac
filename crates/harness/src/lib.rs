//! stackcheck 하네스 -- 컴플라이언스 매트릭스 실행 엔진
//!
//! 명령 도구 변형 × 테스트 시나리오 매트릭스를 만들고, 쌍마다 외부 lifecycle
//! 명령을 실행한 뒤 준비 상태를 기다리고, 검증 콜백을 실행하고, 정리 불변식을
//! 확인합니다.
//!
//! # 아키텍처
//! ```text
//! commands/*.yml ─▶ variant::load_variants ─┐
//!                                          ├─▶ MatrixRunner ─▶ MatrixReport
//! tests/<scenario>/ ─▶ ScenarioCatalog ────┘        │
//!                                                   ├─▶ LifecycleController (up/down)
//!                                                   ├─▶ ReadinessGate
//!                                                   ├─▶ CheckFn(Verifier) ─▶ TargetClient
//!                                                   └─▶ CleanupVerifier
//! ```
//!
//! # 모듈 구성
//! - [`variant`]: 변형 디스크립터 로딩과 인자 렌더링
//! - [`scenario`]: 시나리오 디렉토리 카탈로그
//! - [`lifecycle`]: 외부 명령 실행 ([`CommandRunner`] trait)
//! - [`readiness`]: 헬스 체크 폴링
//! - [`verify`]: 검증 컨텍스트와 진단 메시지
//! - [`probe`]: 타겟 서비스 클라이언트
//! - [`cleanup`]: 잔여 워크로드 확인
//! - [`runner`]: 매트릭스 실행과 결과 집계
//! - [`suite`]: 내장 컴플라이언스 테스트

pub mod cleanup;
pub mod error;
pub mod lifecycle;
pub mod probe;
pub mod readiness;
pub mod runner;
pub mod scenario;
pub mod suite;
pub mod variant;
pub mod verify;

// 에러
pub use error::HarnessError;

// 카탈로그
pub use scenario::{Scenario, ScenarioCatalog, load_scenarios};
pub use variant::{CommandVariant, Opt, Options, Verb, load_variants, parse_descriptor};

// 실행
pub use cleanup::{CleanupVerifier, count_listed_units};
pub use lifecycle::{
    CommandOutput, CommandRunner, Invocation, LifecycleController, LifecycleVerb, ProcessRunner,
    RunnerError,
};
pub use readiness::ReadinessGate;
pub use runner::{
    ComplianceTest, MatrixReport, MatrixRunner, MatrixRunnerBuilder, RunOutcome, RunRecord,
    RunState, runner_from_config,
};

// 검증
pub use probe::{ProbeResponse, TargetClient, json_response, parse_response};
pub use suite::{compliance_suite, select};
pub use verify::{CheckFn, Finding, FindingKind, SpecReference, Verifier};
