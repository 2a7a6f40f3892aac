//! 검증 하네스
//!
//! [`Verifier`]는 실행(run) 하나의 검증 컨텍스트입니다. 검증 콜백은
//! [`Verifier::check`]로 비치명적 단언을 기록하고, 진행할 수 없는 상황에서는
//! [`Verifier::require_ok`] + `?`로 검증을 즉시 중단합니다.
//!
//! 모든 실패 메시지 끝에는 위반한 compose 스펙 조항의 링크가 붙습니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use stackcheck_core::config::DEFAULT_SPEC_BASE_URL;
use tracing::warn;

use crate::error::HarnessError;
use crate::probe::TargetClient;

/// 스펙 문서 내 위치
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecReference {
    /// 문서 URL
    pub base: String,
    /// 섹션 앵커 (없으면 문서 전체)
    pub anchor: Option<String>,
}

impl Default for SpecReference {
    fn default() -> Self {
        Self {
            base: DEFAULT_SPEC_BASE_URL.to_owned(),
            anchor: None,
        }
    }
}

impl SpecReference {
    /// 새 참조를 생성합니다.
    pub fn new(base: impl Into<String>, anchor: Option<String>) -> Self {
        Self {
            base: base.into(),
            anchor,
        }
    }

    /// `base` 또는 `base#anchor`
    pub fn link(&self) -> String {
        match self.anchor.as_deref().filter(|a| !a.is_empty()) {
            Some(anchor) => format!("{}#{anchor}", self.base),
            None => self.base.clone(),
        }
    }
}

impl fmt::Display for SpecReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.link())
    }
}

/// 실행 중 기록되는 실패의 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// `check` 불일치 (비치명적)
    Assertion,
    /// `require_ok` 실패 (검증 중단)
    Fatal,
    /// up / down 실패
    Lifecycle,
    /// 준비 상태 대기 초과
    ReadinessTimeout,
    /// 정리 불변식 위반 (변형 책임)
    Residual,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Assertion => "assertion",
            Self::Fatal => "fatal",
            Self::Lifecycle => "lifecycle",
            Self::ReadinessTimeout => "readiness_timeout",
            Self::Residual => "residual",
        };
        f.write_str(s)
    }
}

/// 기록된 실패 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// 분류
    pub kind: FindingKind,
    /// 사람이 읽을 수 있는 진단 메시지
    pub message: String,
}

/// diff 형식 진단 메시지
pub fn diff_message(expected: &str, actual: &str, reference: &SpecReference) -> String {
    format!(
        "\n- expected: {expected:?}\n+ actual: {actual:?}\nPlease refer to: {}",
        reference.link()
    )
}

struct VerifierInner {
    reference: SpecReference,
    target: TargetClient,
    findings: Mutex<Vec<Finding>>,
}

/// 실행 하나의 검증 컨텍스트
///
/// 복제본은 같은 결과 목록을 공유합니다.
#[derive(Clone)]
pub struct Verifier {
    inner: Arc<VerifierInner>,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("reference", &self.inner.reference)
            .field("findings", &self.findings().len())
            .finish()
    }
}

impl Verifier {
    /// 새 검증 컨텍스트를 생성합니다.
    pub fn new(reference: SpecReference, target: TargetClient) -> Self {
        Self {
            inner: Arc::new(VerifierInner {
                reference,
                target,
                findings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// 타겟 서비스 클라이언트
    pub fn target(&self) -> &TargetClient {
        &self.inner.target
    }

    /// 이 실행의 스펙 참조
    pub fn reference(&self) -> &SpecReference {
        &self.inner.reference
    }

    /// 값을 비교합니다. 불일치는 기록만 하고 검증은 계속됩니다.
    pub fn check(&self, expected: impl AsRef<str>, actual: impl AsRef<str>) -> bool {
        let (expected, actual) = (expected.as_ref(), actual.as_ref());
        if expected == actual {
            return true;
        }
        let message = diff_message(expected, actual, &self.inner.reference);
        warn!(expected = expected, actual = actual, "check failed");
        self.record(FindingKind::Assertion, message);
        false
    }

    /// `Err`이면 치명적 실패를 기록하고 [`HarnessError::Verification`]을 반환합니다.
    ///
    /// 콜백은 `?`로 전파해 검증을 즉시 중단합니다.
    pub fn require_ok<T, E: fmt::Display>(&self, result: Result<T, E>) -> Result<T, HarnessError> {
        result.map_err(|e| {
            let actual = e.to_string();
            let message = diff_message("", &actual, &self.inner.reference);
            warn!(error = %actual, "verification aborted");
            self.record(FindingKind::Fatal, message.clone());
            HarnessError::Verification(message)
        })
    }

    /// 실패를 직접 기록합니다.
    pub fn record(&self, kind: FindingKind, message: impl Into<String>) {
        self.inner
            .findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Finding {
                kind,
                message: message.into(),
            });
    }

    /// 지금까지 기록된 실패 (기록 순서)
    pub fn findings(&self) -> Vec<Finding> {
        self.inner
            .findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 실패가 하나도 없는지 여부
    pub fn is_clean(&self) -> bool {
        self.inner
            .findings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// 검증 콜백이 반환하는 future
pub type CheckFuture = Pin<Box<dyn Future<Output = Result<(), HarnessError>> + Send + 'static>>;

/// 실행마다 호출되는 비동기 검증 콜백
#[derive(Clone)]
pub struct CheckFn {
    f: Arc<dyn Fn(Verifier) -> CheckFuture + Send + Sync>,
}

impl CheckFn {
    /// async 클로저를 감쌉니다.
    ///
    /// ```ignore
    /// let check = CheckFn::new(|v: Verifier| async move {
    ///     let body = v.require_ok(v.target().udp_value().await)?;
    ///     v.check(json_response("value"), body);
    ///     Ok::<(), HarnessError>(())
    /// });
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Verifier) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HarnessError>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |v| Box::pin(f(v))),
        }
    }

    /// 아무것도 검사하지 않는 콜백
    pub fn noop() -> Self {
        Self::new(|_| async { Ok::<(), HarnessError>(()) })
    }

    /// 콜백을 실행합니다.
    pub fn call(&self, verifier: Verifier) -> CheckFuture {
        (self.f)(verifier)
    }
}

impl fmt::Debug for CheckFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CheckFn")
    }
}
