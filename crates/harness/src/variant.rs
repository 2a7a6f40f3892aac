//! 변형 카탈로그 -- 명령 도구 디스크립터 로더
//!
//! 디렉토리 바로 아래의 `.yml`/`.yaml` 파일 하나가 [`CommandVariant`] 하나입니다.
//! 규칙 로더와 달리 파싱 실패를 건너뛰지 않습니다: 잘못된 디스크립터는
//! 매트릭스 전체를 시작 전에 중단시켜야 하기 때문입니다.
//!
//! # 디스크립터 예시
//! ```yaml
//! name: docker-compose
//! command: docker
//! list_command: docker ps -a
//! global_opts:
//!   - name: --log-level
//!     value: error
//! up:
//!   name: compose
//!   opts:
//!     - name: up
//!     - name: -d
//! down:
//!   name: compose
//!   opts:
//!     - name: down
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// 디스크립터 파일 최대 크기
const MAX_DESCRIPTOR_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 이름 + 선택적 값으로 이루어진 옵션 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opt {
    /// 옵션 이름 (예: `-f`, `--project-name`, `up`)
    pub name: String,
    /// 옵션 값. 비어 있으면 이름만 렌더링됩니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Opt {
    /// 값 없는 옵션
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// 값 있는 옵션
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// lifecycle 동사 (up / down) 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
    /// 동사 이름 -- 전역 옵션 뒤, 동사 옵션 앞에 위치합니다.
    pub name: String,
    /// 동사 전용 옵션 (선언 순서 유지)
    #[serde(default)]
    pub opts: Vec<Opt>,
}

/// 순서 있는 인자 벡터 빌더
///
/// 외부 도구는 위치 인자에 민감하므로 추가한 순서 그대로 렌더링합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    args: Vec<String>,
}

impl Options {
    /// 빈 옵션 목록을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 인자 하나를 그대로 추가합니다.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 옵션 하나를 추가합니다. 값이 없거나 빈 문자열이면 이름만 추가됩니다.
    pub fn opt(mut self, opt: &Opt) -> Self {
        self.args.push(opt.name.clone());
        if let Some(value) = opt.value.as_deref().filter(|v| !v.is_empty()) {
            self.args.push(value.to_owned());
        }
        self
    }

    /// 여러 옵션을 선언 순서대로 추가합니다.
    pub fn opts<'a>(self, opts: impl IntoIterator<Item = &'a Opt>) -> Self {
        opts.into_iter().fold(self, |acc, opt| acc.opt(opt))
    }

    /// 렌더링된 인자 벡터를 반환합니다.
    pub fn render(&self) -> Vec<String> {
        self.args.clone()
    }

    /// 렌더링된 인자 벡터로 변환합니다.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

/// 컴플라이언스 대상 명령 도구 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandVariant {
    /// 변형 이름 -- 시나리오 skip 목록과 비교하는 식별자
    pub name: String,
    /// 실행 파일
    pub command: String,
    /// 정리 확인용 목록 명령 (공백으로 분리됨)
    #[serde(alias = "ps_command")]
    pub list_command: String,
    /// 동사 앞에 오는 전역 옵션
    #[serde(default)]
    pub global_opts: Vec<Opt>,
    /// 워크로드 기동
    pub up: Verb,
    /// 워크로드 정리
    pub down: Verb,
}

impl CommandVariant {
    /// `global_opts ++ [verb.name] ++ verb.opts` 순서로 인자를 구성합니다.
    pub fn invocation(&self, verb: &Verb) -> Options {
        Options::new()
            .opts(&self.global_opts)
            .arg(&verb.name)
            .opts(&verb.opts)
    }

    /// `up` 인자 벡터
    pub fn up_args(&self) -> Vec<String> {
        self.invocation(&self.up).into_args()
    }

    /// `down` 인자 벡터
    pub fn down_args(&self) -> Vec<String> {
        self.invocation(&self.down).into_args()
    }

    /// 목록 명령을 (프로그램, 인자)로 분리합니다.
    pub fn list_invocation(&self) -> Result<(String, Vec<String>), HarnessError> {
        let mut parts = self.list_command.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or_else(|| HarnessError::Descriptor {
            path: self.name.clone(),
            reason: "list_command is empty".to_owned(),
        })?;
        Ok((program, parts.collect()))
    }

    /// 필수 필드를 검증합니다.
    pub fn validate(&self, source: &str) -> Result<(), HarnessError> {
        let fail = |reason: &str| HarnessError::Descriptor {
            path: source.to_owned(),
            reason: reason.to_owned(),
        };

        if self.name.trim().is_empty() {
            return Err(fail("name must not be empty"));
        }
        if self.command.trim().is_empty() {
            return Err(fail("command must not be empty"));
        }
        if self.list_command.trim().is_empty() {
            return Err(fail("list_command must not be empty"));
        }
        if self.up.name.trim().is_empty() || self.down.name.trim().is_empty() {
            return Err(fail("up/down verb name must not be empty"));
        }

        let all_opts = self
            .global_opts
            .iter()
            .chain(&self.up.opts)
            .chain(&self.down.opts);
        for opt in all_opts {
            if opt.name.is_empty() {
                return Err(fail("option name must not be empty"));
            }
        }

        Ok(())
    }
}

/// YAML 문자열에서 디스크립터를 파싱하고 검증합니다.
pub fn parse_descriptor(yaml_str: &str, source: &str) -> Result<CommandVariant, HarnessError> {
    let variant: CommandVariant =
        serde_yaml::from_str(yaml_str).map_err(|e| HarnessError::Descriptor {
            path: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })?;

    variant.validate(source)?;

    Ok(variant)
}

/// 단일 디스크립터 파일을 로드합니다.
pub async fn load_variant_file(path: impl AsRef<Path>) -> Result<CommandVariant, HarnessError> {
    let path = path.as_ref();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| HarnessError::Descriptor {
            path: path.display().to_string(),
            reason: format!("failed to read file metadata: {e}"),
        })?;

    if metadata.len() > MAX_DESCRIPTOR_FILE_SIZE {
        return Err(HarnessError::Descriptor {
            path: path.display().to_string(),
            reason: format!(
                "file too large: {} bytes (max: {MAX_DESCRIPTOR_FILE_SIZE})",
                metadata.len()
            ),
        });
    }

    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HarnessError::Descriptor {
                path: path.display().to_string(),
                reason: format!("failed to read file: {e}"),
            })?;

    parse_descriptor(&content, &path.display().to_string())
}

/// 디렉토리 바로 아래의 디스크립터 파일을 모두 로드합니다.
///
/// 하위 디렉토리는 탐색하지 않습니다. 결과는 파일 이름 순으로 정렬되어
/// 리포트 순서가 재현 가능합니다.
///
/// # Errors
/// - 디렉토리를 읽을 수 없는 경우 (`Catalog`)
/// - 어떤 파일이든 파싱 / 검증에 실패한 경우 (`Descriptor`)
/// - 변형 이름이 중복된 경우 (`Descriptor`)
pub async fn load_variants(dir: impl AsRef<Path>) -> Result<Vec<CommandVariant>, HarnessError> {
    let dir = dir.as_ref();

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| HarnessError::Catalog {
            path: dir.display().to_string(),
            reason: format!("failed to read directory: {e}"),
        })?;

    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| HarnessError::Catalog {
            path: dir.display().to_string(),
            reason: format!("failed to read directory entry: {e}"),
        })?
    {
        let path = entry.path();

        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if !is_yaml {
            continue;
        }

        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            continue;
        }

        files.push(path);
    }
    files.sort();

    let mut variants = Vec::with_capacity(files.len());
    let mut seen_names = HashSet::new();
    for path in files {
        let variant = load_variant_file(&path).await?;
        if !seen_names.insert(variant.name.clone()) {
            return Err(HarnessError::Descriptor {
                path: path.display().to_string(),
                reason: format!("duplicate variant name '{}'", variant.name),
            });
        }
        tracing::debug!(
            variant = %variant.name,
            path = %path.display(),
            "loaded command variant"
        );
        variants.push(variant);
    }

    tracing::info!(
        dir = %dir.display(),
        count = variants.len(),
        "loaded command variants"
    );

    Ok(variants)
}
