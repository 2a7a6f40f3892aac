//! 시나리오 카탈로그
//!
//! 테스트 디렉토리의 (숨김이 아닌) 하위 디렉토리 하나가 시나리오 하나입니다.
//! 카탈로그는 주소 지정 가능한 디렉토리 이름만 제공하고, skip 목록과
//! 스펙 참조는 매트릭스를 실행하는 쪽이 [`Scenario`]에 채웁니다.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::HarnessError;

/// 숨김 디렉토리 접두어
const HIDDEN_PREFIX: char = '.';

/// 테스트 픽스처 디렉토리 하나와 그 실행 조건
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    /// 테스트 디렉토리 기준 시나리오 디렉토리 이름
    pub directory: String,
    /// 이 시나리오에서 제외할 변형 이름
    pub skip_variants: BTreeSet<String>,
    /// 스펙 문서 앵커 (진단 메시지 전용)
    pub spec_reference: Option<String>,
}

impl Scenario {
    /// 조건 없는 시나리오를 생성합니다.
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            skip_variants: BTreeSet::new(),
            spec_reference: None,
        }
    }

    /// 제외할 변형을 추가합니다.
    pub fn skip(mut self, variant: impl Into<String>) -> Self {
        self.skip_variants.insert(variant.into());
        self
    }

    /// 스펙 문서 앵커를 지정합니다.
    pub fn spec_reference(mut self, anchor: impl Into<String>) -> Self {
        self.spec_reference = Some(anchor.into());
        self
    }

    /// 변형이 이 시나리오에서 제외되는지 여부
    pub fn skips(&self, variant: &str) -> bool {
        self.skip_variants.contains(variant)
    }
}

/// 디렉토리 바로 아래의 시나리오 이름을 정렬해서 반환합니다.
pub async fn load_scenarios(dir: impl AsRef<Path>) -> Result<Vec<String>, HarnessError> {
    let dir = dir.as_ref();
    let catalog_err = |reason: String| HarnessError::Catalog {
        path: dir.display().to_string(),
        reason,
    };

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| catalog_err(format!("failed to read directory: {e}")))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| catalog_err(format!("failed to read directory entry: {e}")))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| catalog_err(format!("failed to stat entry: {e}")))?;
        if !file_type.is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(path = %entry.path().display(), "non UTF-8 scenario name, skipping");
            continue;
        };
        if name.starts_with(HIDDEN_PREFIX) {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// 로드된 시나리오 디렉토리 목록
#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    root: PathBuf,
    names: BTreeSet<String>,
}

impl ScenarioCatalog {
    /// 테스트 디렉토리를 스캔합니다.
    pub async fn load(root: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = root.into();
        let names = load_scenarios(&root).await?.into_iter().collect();
        Ok(Self { root, names })
    }

    /// 테스트 디렉토리
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 시나리오 이름 (정렬됨)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// 시나리오 존재 여부
    pub fn contains(&self, directory: &str) -> bool {
        self.names.contains(directory)
    }

    /// 시나리오의 픽스처 디렉토리 경로를 반환합니다.
    pub fn resolve(&self, scenario: &Scenario) -> Result<PathBuf, HarnessError> {
        if !self.contains(&scenario.directory) {
            return Err(HarnessError::Catalog {
                path: self.root.join(&scenario.directory).display().to_string(),
                reason: "scenario directory not found in catalog".to_owned(),
            });
        }
        Ok(self.root.join(&scenario.directory))
    }
}
