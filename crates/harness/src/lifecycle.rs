//! Lifecycle 컨트롤러 -- 외부 up / down 명령 실행
//!
//! [`CommandRunner`] trait은 프로세스 실행을 추상화합니다. 운영 코드는
//! [`ProcessRunner`]를, 테스트는 호출을 기록하는 mock 구현을 사용합니다.
//!
//! ```text
//! ┌─────────────────────┐
//! │ LifecycleController │──┐
//! └─────────────────────┘  │   ┌───────────────┐
//! ┌─────────────────────┐  ├──▶│ CommandRunner │ (trait)
//! │  CleanupVerifier    │──┘   └───────────────┘
//! └─────────────────────┘          │       │
//!                                  ▼       ▼
//!                          ProcessRunner   Mock
//! ```
//!
//! 모든 호출은 종료될 때까지 기다리며 재시도하지 않습니다. 제한 시간이
//! 지나면 자식 프로세스를 종료합니다.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use stackcheck_core::metrics as m;
use tracing::{debug, info, warn};

use crate::error::HarnessError;
use crate::variant::CommandVariant;

/// 실행할 외부 명령 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// 실행 파일
    pub program: String,
    /// 인자 (순서 유지)
    pub args: Vec<String>,
    /// 작업 디렉토리. `None`이면 현재 프로세스의 디렉토리
    pub cwd: Option<PathBuf>,
    /// 실행 제한 시간
    pub timeout: Duration,
}

/// 종료된 외부 명령의 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 종료 코드 (시그널로 종료되면 `None`)
    pub code: Option<i32>,
    /// 표준 출력
    pub stdout: String,
    /// 표준 에러
    pub stderr: String,
}

impl CommandOutput {
    /// 종료 코드 0 여부
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// 사람이 읽을 수 있는 종료 상태
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_owned(),
        }
    }
}

/// 명령 실행기 수준의 실패
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// 프로세스를 시작하지 못함
    #[error("failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// 제한 시간 초과 (자식 프로세스는 종료됨)
    #[error("'{program}' did not exit within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// 외부 프로세스 실행 추상화
///
/// `Send + Sync + 'static`이므로 `Arc`로 컨트롤러와 정리 검증기가 공유합니다.
pub trait CommandRunner: Send + Sync + 'static {
    /// 명령을 실행하고 종료될 때까지 기다립니다.
    ///
    /// 0이 아닌 종료 코드는 에러가 아니라 [`CommandOutput`]으로 반환됩니다.
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<CommandOutput, RunnerError>> + Send;
}

/// `tokio::process` 기반 운영용 실행기
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, RunnerError> {
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|e| RunnerError::Spawn {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;

        // 타임아웃 시 future가 drop되면서 kill_on_drop이 자식 프로세스를 종료합니다.
        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_elapsed| RunnerError::TimedOut {
                program: invocation.program.clone(),
                timeout: invocation.timeout,
            })?
            .map_err(|e| RunnerError::Spawn {
                program: invocation.program.clone(),
                reason: format!("failed to collect output: {e}"),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// lifecycle 동사
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleVerb {
    /// 워크로드 기동
    Up,
    /// 워크로드 정리
    Down,
    /// 잔여 워크로드 목록
    List,
}

impl LifecycleVerb {
    /// 메트릭 / 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::List => "list",
        }
    }
}

impl fmt::Display for LifecycleVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 명령을 실행하고 실행기 실패 / 0이 아닌 종료를 [`HarnessError`]로 변환합니다.
///
/// 컨트롤러와 정리 검증기가 같은 규칙을 공유합니다.
pub(crate) async fn run_checked<R: CommandRunner>(
    runner: &R,
    variant: &str,
    verb: LifecycleVerb,
    invocation: &Invocation,
) -> Result<CommandOutput, HarnessError> {
    debug!(
        variant = variant,
        verb = %verb,
        program = %invocation.program,
        args = ?invocation.args,
        cwd = ?invocation.cwd,
        "executing lifecycle command"
    );

    let result = match runner.run(invocation).await {
        Ok(output) if output.success() => Ok(output),
        Ok(output) => Err(HarnessError::Lifecycle {
            variant: variant.to_owned(),
            verb: verb.to_string(),
            status: output.status(),
            stdout: output.stdout,
            stderr: output.stderr,
        }),
        Err(RunnerError::TimedOut { timeout, .. }) => Err(HarnessError::LifecycleTimeout {
            variant: variant.to_owned(),
            verb: verb.to_string(),
            timeout,
        }),
        Err(e @ RunnerError::Spawn { .. }) => Err(HarnessError::Lifecycle {
            variant: variant.to_owned(),
            verb: verb.to_string(),
            status: "spawn failed".to_owned(),
            stdout: String::new(),
            stderr: e.to_string(),
        }),
    };

    let outcome = if result.is_ok() { "success" } else { "failure" };
    metrics::counter!(
        m::LIFECYCLE_COMMANDS_TOTAL,
        m::LABEL_VERB => verb.as_str(),
        m::LABEL_RESULT => outcome
    )
    .increment(1);

    if let Err(ref e) = result {
        warn!(variant = variant, verb = %verb, error = %e, "lifecycle command failed");
    }

    result
}

/// 변형의 up / down 명령을 시나리오 디렉토리에서 실행합니다.
pub struct LifecycleController<R: CommandRunner> {
    /// 명령 실행기
    runner: Arc<R>,
    /// 명령당 제한 시간
    command_timeout: Duration,
}

impl<R: CommandRunner> LifecycleController<R> {
    /// 새 컨트롤러를 생성합니다.
    pub fn new(runner: Arc<R>, command_timeout: Duration) -> Self {
        Self {
            runner,
            command_timeout,
        }
    }

    /// 워크로드를 기동합니다.
    pub async fn up(
        &self,
        variant: &CommandVariant,
        scenario_dir: &Path,
    ) -> Result<CommandOutput, HarnessError> {
        let invocation = self.invocation(variant, variant.up_args(), scenario_dir);
        let output = run_checked(&*self.runner, &variant.name, LifecycleVerb::Up, &invocation).await?;
        info!(variant = %variant.name, dir = %scenario_dir.display(), "workload up");
        Ok(output)
    }

    /// 워크로드를 정리합니다.
    pub async fn down(
        &self,
        variant: &CommandVariant,
        scenario_dir: &Path,
    ) -> Result<CommandOutput, HarnessError> {
        let invocation = self.invocation(variant, variant.down_args(), scenario_dir);
        let output =
            run_checked(&*self.runner, &variant.name, LifecycleVerb::Down, &invocation).await?;
        info!(variant = %variant.name, dir = %scenario_dir.display(), "workload down");
        Ok(output)
    }

    fn invocation(&self, variant: &CommandVariant, args: Vec<String>, cwd: &Path) -> Invocation {
        Invocation {
            program: variant.command.clone(),
            args,
            cwd: Some(cwd.to_path_buf()),
            timeout: self.command_timeout,
        }
    }
}
