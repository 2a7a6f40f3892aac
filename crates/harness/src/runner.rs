//! 매트릭스 러너 -- (변형, 시나리오) 쌍마다 실행 하나
//!
//! 실행은 항상 순차적입니다. 워크로드가 고정 호스트 포트를 바인딩하므로
//! 실행이 겹치면 서로 충돌합니다.
//!
//! # 실행 순서
//! ```text
//! Pending ─▶ Up ─▶ Ready ──▶ Verified | Failed ─▶ Down ─▶ CleanedUp | Residual
//!              │     └─▶ TimedOut ──────────────────▲
//!              └─▶ Failed (up 실패) ─────────────────┘
//! ```
//! up 실패, 준비 대기 초과, down 실패가 있어도 정리 검증까지는 항상 진행합니다.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use stackcheck_core::HarnessConfig;
use stackcheck_core::metrics as m;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::cleanup::{CleanupVerifier, RESIDUAL_MESSAGE};
use crate::error::HarnessError;
use crate::lifecycle::{CommandRunner, LifecycleController};
use crate::probe::TargetClient;
use crate::readiness::ReadinessGate;
use crate::scenario::{Scenario, ScenarioCatalog};
use crate::variant::CommandVariant;
use crate::verify::{CheckFn, FindingKind, Finding, SpecReference, Verifier, diff_message};

/// 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// 시작 전
    Pending,
    /// up 성공
    Up,
    /// 헬스 체크 통과
    Ready,
    /// 헬스 체크 대기 초과
    TimedOut,
    /// 검증 통과
    Verified,
    /// 검증 또는 lifecycle 실패
    Failed,
    /// down 성공
    Down,
    /// 잔여 워크로드 없음
    CleanedUp,
    /// 잔여 워크로드 있음
    Residual,
}

/// 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// 모든 단계 통과
    Passed,
    /// 하나 이상의 실패 기록
    Failed,
    /// 시나리오 skip 목록에 포함된 변형
    Skipped,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// 실행 하나의 기록
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// 실행 ID (uuid v4)
    pub run_id: String,
    /// 컴플라이언스 테스트 이름 (`run_matrix`로 실행하면 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    /// 변형 이름
    pub variant: String,
    /// 시나리오 디렉토리
    pub scenario: String,
    /// 결과
    pub outcome: RunOutcome,
    /// 거쳐 간 상태 (순서대로)
    pub states: Vec<RunState>,
    /// 기록된 실패
    pub findings: Vec<Finding>,
    /// 소요 시간 (밀리초)
    pub duration_ms: u64,
}

impl RunRecord {
    /// 잔여 워크로드가 감지된 실행인지 여부
    pub fn has_residual(&self) -> bool {
        self.states.contains(&RunState::Residual)
    }
}

/// 매트릭스 전체 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatrixReport {
    /// 실행 기록 (실행 순서)
    pub runs: Vec<RunRecord>,
}

impl MatrixReport {
    fn count(&self, outcome: RunOutcome) -> usize {
        self.runs.iter().filter(|r| r.outcome == outcome).count()
    }

    /// 통과한 실행 수
    pub fn passed(&self) -> usize {
        self.count(RunOutcome::Passed)
    }

    /// 실패한 실행 수
    pub fn failed(&self) -> usize {
        self.count(RunOutcome::Failed)
    }

    /// 건너뛴 실행 수
    pub fn skipped(&self) -> usize {
        self.count(RunOutcome::Skipped)
    }

    /// 실패한 실행이 하나도 없는지 여부
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// 정리 불변식을 위반한 변형 이름
    pub fn residual_variants(&self) -> BTreeSet<&str> {
        self.runs
            .iter()
            .filter(|r| r.has_residual())
            .map(|r| r.variant.as_str())
            .collect()
    }
}

/// 이름 + 시나리오 + 검증 콜백
#[derive(Debug, Clone)]
pub struct ComplianceTest {
    /// 테스트 이름
    pub name: String,
    /// 시나리오와 skip 목록
    pub scenario: Scenario,
    /// 검증 콜백
    pub check: CheckFn,
}

impl ComplianceTest {
    /// 새 테스트를 생성합니다.
    pub fn new(name: impl Into<String>, scenario: Scenario, check: CheckFn) -> Self {
        Self {
            name: name.into(),
            scenario,
            check,
        }
    }
}

/// 매트릭스 실행기
pub struct MatrixRunner<R: CommandRunner> {
    lifecycle: LifecycleController<R>,
    cleanup: CleanupVerifier<R>,
    gate: ReadinessGate,
    catalog: ScenarioCatalog,
    target: TargetClient,
    config: HarnessConfig,
}

impl<R: CommandRunner> MatrixRunner<R> {
    /// 시나리오 카탈로그
    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// 변형 × 시나리오 전체를 같은 콜백으로 실행합니다.
    ///
    /// 순서는 변형, 그 다음 시나리오입니다. 카탈로그에 없는 시나리오가 있으면
    /// 실행을 하나도 시작하지 않고 에러를 반환합니다.
    pub async fn run_matrix(
        &self,
        variants: &[CommandVariant],
        scenarios: &[Scenario],
        check: &CheckFn,
    ) -> Result<MatrixReport, HarnessError> {
        let resolved = scenarios
            .iter()
            .map(|s| self.catalog.resolve(s).map(|dir| (s, dir)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = MatrixReport::default();
        for variant in variants {
            for (scenario, dir) in &resolved {
                let record = self.run_one(variant, scenario, dir, check, None).await;
                report.runs.push(record);
            }
        }
        log_summary(&report);
        Ok(report)
    }

    /// 컴플라이언스 테스트마다 모든 변형을 실행합니다.
    ///
    /// 순서는 테스트, 그 다음 변형입니다.
    pub async fn run_suite(
        &self,
        variants: &[CommandVariant],
        tests: &[ComplianceTest],
    ) -> Result<MatrixReport, HarnessError> {
        let resolved = tests
            .iter()
            .map(|t| self.catalog.resolve(&t.scenario).map(|dir| (t, dir)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = MatrixReport::default();
        for (test, dir) in &resolved {
            for variant in variants {
                let record = self
                    .run_one(variant, &test.scenario, dir, &test.check, Some(&test.name))
                    .await;
                report.runs.push(record);
            }
        }
        log_summary(&report);
        Ok(report)
    }

    async fn run_one(
        &self,
        variant: &CommandVariant,
        scenario: &Scenario,
        dir: &Path,
        check: &CheckFn,
        test: Option<&str>,
    ) -> RunRecord {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "run",
            run_id = %run_id,
            test = test.unwrap_or(""),
            variant = %variant.name,
            scenario = %scenario.directory,
        );

        async {
            let started = Instant::now();
            let mut states = vec![RunState::Pending];

            if scenario.skips(&variant.name) {
                info!("variant excluded for scenario, skipping");
                return self.finish(
                    run_id,
                    test,
                    variant,
                    scenario,
                    RunOutcome::Skipped,
                    states,
                    Vec::new(),
                    started,
                );
            }

            let reference = SpecReference::new(
                self.config.spec_base_url.clone(),
                scenario.spec_reference.clone(),
            );
            let verifier = Verifier::new(reference.clone(), self.target.clone());

            match self.lifecycle.up(variant, dir).await {
                Ok(_) => {
                    states.push(RunState::Up);
                    self.gate_and_verify(&verifier, &reference, check, &mut states)
                        .await;
                }
                Err(e) => {
                    verifier.record(FindingKind::Lifecycle, lifecycle_message(&e));
                    states.push(RunState::Failed);
                }
            }

            match self.lifecycle.down(variant, dir).await {
                Ok(_) => states.push(RunState::Down),
                Err(e) => verifier.record(FindingKind::Lifecycle, lifecycle_message(&e)),
            }

            match self.cleanup.check_clean_up(variant).await {
                Ok(_) => states.push(RunState::CleanedUp),
                Err(HarnessError::ResidualWorkload { listing, .. }) => {
                    verifier.record(
                        FindingKind::Residual,
                        format!(
                            "{RESIDUAL_MESSAGE}\n{}\nPlease refer to: {}",
                            listing.trim_end(),
                            reference.link()
                        ),
                    );
                    states.push(RunState::Residual);
                }
                Err(e) => {
                    verifier.record(FindingKind::Lifecycle, lifecycle_message(&e));
                    states.push(RunState::Failed);
                }
            }

            let findings = verifier.findings();
            let outcome = if findings.is_empty() {
                RunOutcome::Passed
            } else {
                RunOutcome::Failed
            };
            self.finish(
                run_id, test, variant, scenario, outcome, states, findings, started,
            )
        }
        .instrument(span)
        .await
    }

    async fn gate_and_verify(
        &self,
        verifier: &Verifier,
        reference: &SpecReference,
        check: &CheckFn,
        states: &mut Vec<RunState>,
    ) {
        let url = &self.config.health_check_url;
        let timeout = self.config.ready_timeout();
        if !self.gate.await_ready(url, timeout).await {
            let err = HarnessError::ReadinessTimeout {
                url: url.clone(),
                timeout,
            };
            warn!(error = %err, "skipping verification");
            verifier.record(
                FindingKind::ReadinessTimeout,
                format!("{err}\nPlease refer to: {}", reference.link()),
            );
            states.push(RunState::TimedOut);
            return;
        }
        states.push(RunState::Ready);

        match check.call(verifier.clone()).await {
            Ok(()) if verifier.is_clean() => states.push(RunState::Verified),
            Ok(()) => states.push(RunState::Failed),
            // require_ok가 이미 기록함
            Err(HarnessError::Verification(_)) => states.push(RunState::Failed),
            Err(e) => {
                verifier.record(
                    FindingKind::Fatal,
                    diff_message("", &e.to_string(), reference),
                );
                states.push(RunState::Failed);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        run_id: String,
        test: Option<&str>,
        variant: &CommandVariant,
        scenario: &Scenario,
        outcome: RunOutcome,
        states: Vec<RunState>,
        findings: Vec<Finding>,
        started: Instant,
    ) -> RunRecord {
        let elapsed = started.elapsed();
        let outcome_label = outcome.to_string();
        metrics::counter!(m::RUNS_TOTAL, m::LABEL_RESULT => outcome_label).increment(1);
        if outcome != RunOutcome::Skipped {
            metrics::histogram!(m::RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());
        }

        match outcome {
            RunOutcome::Failed => error!(
                findings = findings.len(),
                states = ?states,
                "run failed"
            ),
            _ => info!(outcome = %outcome, states = ?states, "run finished"),
        }

        RunRecord {
            run_id,
            test: test.map(str::to_owned),
            variant: variant.name.clone(),
            scenario: scenario.directory.clone(),
            outcome,
            states,
            findings,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

fn lifecycle_message(err: &HarnessError) -> String {
    match err {
        HarnessError::Lifecycle { stdout, stderr, .. } => {
            format!("{err}\nstdout: {}\nstderr: {}", stdout.trim_end(), stderr.trim_end())
        }
        other => other.to_string(),
    }
}

fn log_summary(report: &MatrixReport) {
    info!(
        runs = report.runs.len(),
        passed = report.passed(),
        failed = report.failed(),
        skipped = report.skipped(),
        "matrix finished"
    );
}

/// [`MatrixRunner`] 빌더
pub struct MatrixRunnerBuilder<R: CommandRunner> {
    config: HarnessConfig,
    runner: Option<Arc<R>>,
    catalog: Option<ScenarioCatalog>,
    target: Option<TargetClient>,
}

impl<R: CommandRunner> MatrixRunnerBuilder<R> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            runner: None,
            catalog: None,
            target: None,
        }
    }

    /// 하네스 설정을 지정합니다.
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// 명령 실행기를 설정합니다.
    pub fn command_runner(mut self, runner: Arc<R>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// 로드된 시나리오 카탈로그를 설정합니다.
    pub fn catalog(mut self, catalog: ScenarioCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// 타겟 서비스 클라이언트를 설정합니다.
    pub fn target(mut self, target: TargetClient) -> Self {
        self.target = Some(target);
        self
    }

    /// 러너를 빌드합니다.
    pub fn build(self) -> Result<MatrixRunner<R>, HarnessError> {
        let runner = self.runner.ok_or_else(|| missing("command_runner"))?;
        let catalog = self.catalog.ok_or_else(|| missing("catalog"))?;
        let target = self.target.ok_or_else(|| missing("target"))?;

        let timeout = self.config.command_timeout();
        let gate = ReadinessGate::new(self.config.poll_interval())?;

        Ok(MatrixRunner {
            lifecycle: LifecycleController::new(Arc::clone(&runner), timeout),
            cleanup: CleanupVerifier::new(runner, timeout),
            gate,
            catalog,
            target,
            config: self.config,
        })
    }
}

impl<R: CommandRunner> Default for MatrixRunnerBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(field: &str) -> HarnessError {
    HarnessError::Catalog {
        path: field.to_owned(),
        reason: format!("{field} must be provided"),
    }
}

/// 테스트 디렉토리 경로를 카탈로그로 로드하고 러너를 빌드하는 단축 함수
pub async fn runner_from_config<R: CommandRunner>(
    runner: Arc<R>,
    config: HarnessConfig,
    tests_dir: impl Into<PathBuf>,
    target: TargetClient,
) -> Result<MatrixRunner<R>, HarnessError> {
    let catalog = ScenarioCatalog::load(tests_dir).await?;
    MatrixRunnerBuilder::new()
        .config(config)
        .command_runner(runner)
        .catalog(catalog)
        .target(target)
        .build()
}
