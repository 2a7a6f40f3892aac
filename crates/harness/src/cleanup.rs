//! 정리 검증기 -- down 이후 잔여 워크로드 확인
//!
//! 다음 실행은 이전 실행이 깨끗한 상태를 남겼다고 가정합니다. 따라서 잔여
//! 유닛은 시나리오가 아니라 리소스를 해제하지 못한 변형의 실패로 기록합니다.

use std::sync::Arc;
use std::time::Duration;

use stackcheck_core::metrics as m;
use tracing::{debug, warn};

use crate::error::HarnessError;
use crate::lifecycle::{CommandRunner, Invocation, LifecycleVerb, run_checked};
use crate::variant::CommandVariant;

/// 잔여 워크로드 진단 메시지
pub const RESIDUAL_MESSAGE: &str = "Problem checking containers' state. \
     There shouldn't be any containers before or after a test.";

/// 목록 명령 출력에서 헤더 행을 뺀 유닛 수를 셉니다.
///
/// 앞뒤 개행을 제거한 뒤 줄 수에서 1을 뺍니다. 빈 출력은 0입니다.
pub fn count_listed_units(stdout: &str) -> usize {
    stdout.trim_matches('\n').split('\n').count().saturating_sub(1)
}

/// 변형의 목록 명령으로 정리 불변식을 확인합니다.
pub struct CleanupVerifier<R: CommandRunner> {
    runner: Arc<R>,
    command_timeout: Duration,
}

impl<R: CommandRunner> CleanupVerifier<R> {
    /// 새 검증기를 생성합니다.
    pub fn new(runner: Arc<R>, command_timeout: Duration) -> Self {
        Self {
            runner,
            command_timeout,
        }
    }

    /// 잔여 유닛이 없으면 `Ok(0)`을 반환합니다.
    ///
    /// # Errors
    /// - 목록 명령 실패: `Lifecycle` / `LifecycleTimeout`
    /// - 잔여 유닛 존재: `ResidualWorkload`
    pub async fn check_clean_up(&self, variant: &CommandVariant) -> Result<usize, HarnessError> {
        let (program, args) = variant.list_invocation()?;
        let invocation = Invocation {
            program,
            args,
            cwd: None,
            timeout: self.command_timeout,
        };

        let output =
            run_checked(&*self.runner, &variant.name, LifecycleVerb::List, &invocation).await?;
        let count = count_listed_units(&output.stdout);

        if count > 0 {
            metrics::counter!(m::RESIDUAL_UNITS_TOTAL).increment(count as u64);
            warn!(variant = %variant.name, count = count, "residual workload after teardown");
            return Err(HarnessError::ResidualWorkload {
                variant: variant.name.clone(),
                count,
                listing: output.stdout,
            });
        }

        debug!(variant = %variant.name, "no residual workload");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CommandOutput;
    use crate::lifecycle::mock::RecordingRunner;
    use crate::variant::parse_descriptor;

    const HEADER: &str = "CONTAINER ID   IMAGE   COMMAND   CREATED   STATUS   PORTS   NAMES";

    fn variant() -> CommandVariant {
        parse_descriptor(
            "name: docker-compose\ncommand: docker\nlist_command: docker ps -a\nup: { name: up }\ndown: { name: down }\n",
            "docker-compose.yml",
        )
        .unwrap()
    }

    #[test]
    fn counting_excludes_header_and_trailing_newline() {
        assert_eq!(count_listed_units(""), 0);
        assert_eq!(count_listed_units(&format!("{HEADER}\n")), 0);
        assert_eq!(count_listed_units(&format!("\n{HEADER}\n\n")), 0);
        assert_eq!(count_listed_units(&format!("{HEADER}\nabc123 target\n")), 1);
        assert_eq!(
            count_listed_units(&format!("{HEADER}\nabc target\ndef client\n")),
            2
        );
    }

    #[tokio::test]
    async fn header_only_listing_is_clean() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(
            "ps",
            CommandOutput {
                code: Some(0),
                stdout: format!("{HEADER}\n"),
                stderr: String::new(),
            },
        );
        let verifier = CleanupVerifier::new(Arc::clone(&runner), Duration::from_secs(5));

        assert_eq!(verifier.check_clean_up(&variant()).await.unwrap(), 0);

        let calls = runner.calls();
        assert_eq!(calls[0].program, "docker");
        assert_eq!(calls[0].args, vec!["ps", "-a"]);
        assert!(calls[0].cwd.is_none());
    }

    #[tokio::test]
    async fn residual_units_are_attributed_to_variant() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(
            "ps",
            CommandOutput {
                code: Some(0),
                stdout: format!("{HEADER}\nabc123 target\n"),
                stderr: String::new(),
            },
        );
        let verifier = CleanupVerifier::new(Arc::clone(&runner), Duration::from_secs(5));

        match verifier.check_clean_up(&variant()).await.unwrap_err() {
            HarnessError::ResidualWorkload {
                variant,
                count,
                listing,
            } => {
                assert_eq!(variant, "docker-compose");
                assert_eq!(count, 1);
                assert!(listing.contains("abc123"));
            }
            other => panic!("expected ResidualWorkload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_list_command_is_lifecycle_error() {
        let runner = Arc::new(RecordingRunner::new());
        runner.respond(
            "ps",
            CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "daemon not running".to_owned(),
            },
        );
        let verifier = CleanupVerifier::new(Arc::clone(&runner), Duration::from_secs(5));

        assert!(matches!(
            verifier.check_clean_up(&variant()).await,
            Err(HarnessError::Lifecycle { .. })
        ));
    }
}
