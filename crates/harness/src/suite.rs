//! 내장 컴플라이언스 스위트
//!
//! 각 테스트는 `tests/` 아래 픽스처 디렉토리 하나와 그 워크로드에 대한 검증
//! 콜백입니다. 픽스처는 타겟 서비스를 `127.0.0.1:8080` (HTTP) /
//! `127.0.0.1:10001` (UDP)에 노출한다고 가정합니다.

use std::time::Duration;

use crate::error::HarnessError;
use crate::probe::json_response;
use crate::runner::ComplianceTest;
use crate::scenario::Scenario;
use crate::verify::{CheckFn, Verifier};

const NETWORKS_REF: &str = "Networks-top-level-element";

/// 같은 네트워크의 타겟 서비스 주소
const PING_TARGET: &str = "target:8080/ping";

/// 스케일 시나리오의 클라이언트 복제본 수
const EXPECTED_REPLICAS: &str = "3";

/// 스위트 전체 (선언 순서)
pub fn compliance_suite() -> Vec<ComplianceTest> {
    vec![
        ComplianceTest::new(
            "simple_lifecycle",
            Scenario::new("simple_lifecycle"),
            CheckFn::new(|_v: Verifier| async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<(), HarnessError>(())
            }),
        ),
        ComplianceTest::new(
            "simple_network",
            Scenario::new("simple_network").spec_reference(NETWORKS_REF),
            CheckFn::new(|v: Verifier| async move {
                let actual = v.require_ok(v.target().ping(PING_TARGET).await)?;
                v.check(json_response("PONG FROM TARGET"), actual);
                Ok::<(), HarnessError>(())
            }),
        ),
        ComplianceTest::new(
            "simple_network_fail",
            Scenario::new("simple_network").spec_reference(NETWORKS_REF),
            CheckFn::new(|v: Verifier| async move {
                let address = "notatarget:8080/ping";
                let actual = v.require_ok(v.target().ping(address).await)?;
                v.check(
                    json_response(&format!("Could not reach address: {address}")),
                    actual,
                );
                Ok::<(), HarnessError>(())
            }),
        ),
        ComplianceTest::new(
            "different_networks",
            Scenario::new("different_networks").spec_reference(NETWORKS_REF),
            CheckFn::new(|v: Verifier| async move {
                let actual = v.require_ok(v.target().ping(PING_TARGET).await)?;
                v.check(
                    json_response(&format!("Could not reach address: {PING_TARGET}")),
                    actual,
                );
                Ok::<(), HarnessError>(())
            }),
        ),
        file_test(
            "volume_file",
            Scenario::new("simple_volume").spec_reference("volumes-top-level-element"),
            "test_volume.txt",
            "MYVOLUME",
        ),
        file_test(
            "secret_file",
            Scenario::new("simple_secretfile").spec_reference("secrets-top-level-element"),
            "test_secret.txt",
            "MYSECRET",
        ),
        file_test(
            "config_file",
            Scenario::new("simple_configfile")
                .skip("docker-composeV1")
                .spec_reference("configs-top-level-element"),
            "test_config.txt",
            "MYCONFIG",
        ),
        ComplianceTest::new(
            "udp_port",
            Scenario::new("udp_port").spec_reference(NETWORKS_REF),
            CheckFn::new(|v: Verifier| async move {
                let value = "myUdpvalue";
                v.require_ok(v.target().send_udp(value).await)?;
                // 수신기가 값을 저장할 시간
                tokio::time::sleep(Duration::from_secs(1)).await;
                let actual = v.require_ok(v.target().udp_value().await)?;
                v.check(json_response(value), actual);
                Ok::<(), HarnessError>(())
            }),
        ),
        ComplianceTest::new(
            "scaling",
            Scenario::new("scaling")
                .skip("compose-ref")
                .spec_reference(NETWORKS_REF),
            CheckFn::new(|v: Verifier| async move {
                // 복제본들이 등록할 시간
                tokio::time::sleep(Duration::from_secs(2)).await;
                let count = v.require_ok(v.target().scale_count().await)?;
                v.check(EXPECTED_REPLICAS, count);
                Ok::<(), HarnessError>(())
            }),
        ),
    ]
}

fn file_test(
    name: &str,
    scenario: Scenario,
    filename: &'static str,
    expected: &'static str,
) -> ComplianceTest {
    ComplianceTest::new(
        name,
        scenario,
        CheckFn::new(move |v: Verifier| async move {
            let actual = v.require_ok(v.target().volume_file(filename).await)?;
            v.check(json_response(expected), actual);
            Ok::<(), HarnessError>(())
        }),
    )
}

/// 이름으로 테스트를 고릅니다. `names`가 비어 있으면 전체를 반환합니다.
///
/// 알 수 없는 이름은 `Err`로 모아서 반환합니다.
pub fn select(
    tests: Vec<ComplianceTest>,
    names: &[String],
) -> Result<Vec<ComplianceTest>, Vec<String>> {
    if names.is_empty() {
        return Ok(tests);
    }

    let unknown: Vec<String> = names
        .iter()
        .filter(|n| !tests.iter().any(|t| &t.name == *n))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }

    Ok(tests
        .into_iter()
        .filter(|t| names.iter().any(|n| n == &t.name))
        .collect())
}
