//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았다면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stackcheck_`
//! - 모듈명: 하네스는 접두어만, 타겟 서비스는 `target_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (passed, failed, skipped / success, failure)
pub const LABEL_RESULT: &str = "result";

/// lifecycle 동사 레이블 키 (up, down, list)
pub const LABEL_VERB: &str = "verb";

/// 타겟 서비스 엔드포인트 레이블 키 (ping, volumefile, udp, scalechecker)
pub const LABEL_ENDPOINT: &str = "endpoint";

// ─── Harness 메트릭 ─────────────────────────────────────────────────

/// Harness: 완료된 실행(run) 수 (counter, label: result)
pub const RUNS_TOTAL: &str = "stackcheck_runs_total";

/// Harness: 실행 하나의 소요 시간 (histogram, 초)
pub const RUN_DURATION_SECONDS: &str = "stackcheck_run_duration_seconds";

/// Harness: 실행된 lifecycle 명령 수 (counter, labels: verb, result)
pub const LIFECYCLE_COMMANDS_TOTAL: &str = "stackcheck_lifecycle_commands_total";

/// Harness: 준비 상태 대기 시간 (histogram, 초)
pub const READINESS_WAIT_SECONDS: &str = "stackcheck_readiness_wait_seconds";

/// Harness: 정리 후 발견된 잔여 워크로드 유닛 수 (counter)
pub const RESIDUAL_UNITS_TOTAL: &str = "stackcheck_residual_units_total";

// ─── Target Service 메트릭 ──────────────────────────────────────────

/// Target: 처리한 HTTP 요청 수 (counter, label: endpoint)
pub const TARGET_REQUESTS_TOTAL: &str = "stackcheck_target_requests_total";

/// Target: 수신한 UDP 데이터그램 수 (counter, label: result)
pub const TARGET_UDP_DATAGRAMS_TOTAL: &str = "stackcheck_target_udp_datagrams_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 실행 소요 시간 히스토그램 버킷 (초)
///
/// lifecycle 명령이 이미지 풀을 포함할 수 있어 넓게 잡습니다.
pub const RUN_DURATION_BUCKETS: [f64; 9] = [0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        RUNS_TOTAL,
        "Total number of (variant, scenario) runs by result"
    );
    describe_histogram!(
        RUN_DURATION_SECONDS,
        "Wall-clock duration of a single run in seconds"
    );
    describe_counter!(
        LIFECYCLE_COMMANDS_TOTAL,
        "External lifecycle commands executed per verb and result"
    );
    describe_histogram!(
        READINESS_WAIT_SECONDS,
        "Time spent waiting for the workload health check in seconds"
    );
    describe_counter!(
        RESIDUAL_UNITS_TOTAL,
        "Workload units still listed after teardown"
    );

    describe_counter!(
        TARGET_REQUESTS_TOTAL,
        "HTTP requests served by the target service per endpoint"
    );
    describe_counter!(
        TARGET_UDP_DATAGRAMS_TOTAL,
        "UDP datagrams received by the target service"
    );
}
