//! 설정 관리 -- stackcheck.toml 파싱 및 런타임 설정
//!
//! [`StackcheckConfig`]는 하네스와 CLI가 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`STACKCHECK_HARNESS_COMMANDS_DIR=commands` 형식)
//! 3. 설정 파일 (`stackcheck.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), stackcheck_core::error::StackcheckError> {
//! use stackcheck_core::config::StackcheckConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = StackcheckConfig::load("stackcheck.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = StackcheckConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StackcheckError};

/// 기본 스펙 문서 위치 -- 실패 메시지의 참조 링크 기준
pub const DEFAULT_SPEC_BASE_URL: &str =
    "https://github.com/compose-spec/compose-spec/blob/master/spec.md";

/// 설정 상한값 상수
const MAX_READY_TIMEOUT_SECS: u64 = 600;
const MAX_POLL_INTERVAL_MS: u64 = 10_000;
const MAX_COMMAND_TIMEOUT_SECS: u64 = 3600;

/// stackcheck 통합 설정
///
/// `stackcheck.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackcheckConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 하네스(매트릭스 실행) 설정
    #[serde(default)]
    pub harness: HarnessConfig,
    /// 타겟 서비스 접속 설정
    #[serde(default)]
    pub target: TargetEndpointConfig,
}

impl StackcheckConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StackcheckError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에서 시작합니다.
    ///
    /// 파일이 존재하지만 파싱에 실패하면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, StackcheckError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(StackcheckError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StackcheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StackcheckError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StackcheckError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, StackcheckError> {
        toml::from_str(toml_str).map_err(|e| {
            StackcheckError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `STACKCHECK_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STACKCHECK_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "STACKCHECK_GENERAL_LOG_FORMAT",
        );

        // Harness
        override_string(
            &mut self.harness.commands_dir,
            "STACKCHECK_HARNESS_COMMANDS_DIR",
        );
        override_string(&mut self.harness.tests_dir, "STACKCHECK_HARNESS_TESTS_DIR");
        override_string(
            &mut self.harness.health_check_url,
            "STACKCHECK_HARNESS_HEALTH_CHECK_URL",
        );
        override_u64(
            &mut self.harness.ready_timeout_secs,
            "STACKCHECK_HARNESS_READY_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.harness.poll_interval_ms,
            "STACKCHECK_HARNESS_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.harness.command_timeout_secs,
            "STACKCHECK_HARNESS_COMMAND_TIMEOUT_SECS",
        );
        override_string(
            &mut self.harness.spec_base_url,
            "STACKCHECK_HARNESS_SPEC_BASE_URL",
        );

        // Target
        override_string(&mut self.target.host, "STACKCHECK_TARGET_HOST");
        override_u16(&mut self.target.http_port, "STACKCHECK_TARGET_HTTP_PORT");
        override_u16(&mut self.target.udp_port, "STACKCHECK_TARGET_UDP_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StackcheckError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.harness.commands_dir.is_empty() {
            return Err(invalid("harness.commands_dir", "must not be empty"));
        }
        if self.harness.tests_dir.is_empty() {
            return Err(invalid("harness.tests_dir", "must not be empty"));
        }

        if !self.harness.health_check_url.starts_with("http://")
            && !self.harness.health_check_url.starts_with("https://")
        {
            return Err(invalid(
                "harness.health_check_url",
                "must be an http:// or https:// URL",
            ));
        }

        if self.harness.ready_timeout_secs == 0
            || self.harness.ready_timeout_secs > MAX_READY_TIMEOUT_SECS
        {
            return Err(invalid(
                "harness.ready_timeout_secs",
                format!("must be 1-{MAX_READY_TIMEOUT_SECS}"),
            ));
        }

        if self.harness.poll_interval_ms == 0 || self.harness.poll_interval_ms > MAX_POLL_INTERVAL_MS
        {
            return Err(invalid(
                "harness.poll_interval_ms",
                format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            ));
        }

        if self.harness.command_timeout_secs == 0
            || self.harness.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS
        {
            return Err(invalid(
                "harness.command_timeout_secs",
                format!("must be 1-{MAX_COMMAND_TIMEOUT_SECS}"),
            ));
        }

        if self.target.host.is_empty() {
            return Err(invalid("target.host", "must not be empty"));
        }
        if self.target.http_port == 0 || self.target.udp_port == 0 {
            return Err(invalid("target", "ports must be non-zero"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> StackcheckError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 하네스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// 변형 디스크립터(`*.yml`) 디렉토리
    pub commands_dir: String,
    /// 시나리오 디렉토리들의 상위 디렉토리
    pub tests_dir: String,
    /// 준비 상태 확인 URL
    pub health_check_url: String,
    /// 준비 상태 대기 상한 (초)
    pub ready_timeout_secs: u64,
    /// 준비 상태 폴링 간격 (밀리초)
    pub poll_interval_ms: u64,
    /// 외부 명령 실행 상한 (초)
    pub command_timeout_secs: u64,
    /// 실패 메시지에 붙는 스펙 문서 기준 URL
    pub spec_base_url: String,
}

impl HarnessConfig {
    /// 준비 상태 대기 상한
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// 폴링 간격
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 외부 명령 실행 상한
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            commands_dir: "commands".to_owned(),
            tests_dir: "tests".to_owned(),
            health_check_url: "http://127.0.0.1:8080/ping".to_owned(),
            ready_timeout_secs: 5,
            poll_interval_ms: 100,
            command_timeout_secs: 300,
            spec_base_url: DEFAULT_SPEC_BASE_URL.to_owned(),
        }
    }
}

/// 타겟 서비스 접속 설정 (하네스 쪽에서 바라본 주소)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetEndpointConfig {
    /// 호스트 (포트 퍼블리시된 워크로드 기준)
    pub host: String,
    /// HTTP 포트
    pub http_port: u16,
    /// UDP 포트
    pub udp_port: u16,
}

impl Default for TargetEndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: 8080,
            udp_port: 10001,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = StackcheckConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.harness.commands_dir, "commands");
        assert_eq!(config.harness.tests_dir, "tests");
        assert_eq!(config.harness.health_check_url, "http://127.0.0.1:8080/ping");
        assert_eq!(config.harness.ready_timeout(), Duration::from_secs(5));
        assert_eq!(config.target.udp_port, 10001);
    }

    #[test]
    fn default_config_passes_validation() {
        StackcheckConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = StackcheckConfig::parse("").unwrap();
        assert_eq!(config.harness.spec_base_url, DEFAULT_SPEC_BASE_URL);
        assert_eq!(config.target.http_port, 8080);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[harness]
commands_dir = "/opt/stackcheck/commands"
ready_timeout_secs = 30

[target]
http_port = 18080
"#;
        let config = StackcheckConfig::parse(toml).unwrap();
        assert_eq!(config.harness.commands_dir, "/opt/stackcheck/commands");
        assert_eq!(config.harness.ready_timeout_secs, 30);
        // tests_dir은 기본값 유지
        assert_eq!(config.harness.tests_dir, "tests");
        assert_eq!(config.target.http_port, 18080);
        assert_eq!(config.target.udp_port, 10001);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = StackcheckConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            StackcheckError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = StackcheckConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_ready_timeout() {
        let mut config = StackcheckConfig::default();
        config.harness.ready_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ready_timeout_secs"));
    }

    #[test]
    fn validate_rejects_non_http_health_check_url() {
        let mut config = StackcheckConfig::default();
        config.harness.health_check_url = "127.0.0.1:8080/ping".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("health_check_url"));
    }

    #[test]
    fn validate_rejects_excessive_command_timeout() {
        let mut config = StackcheckConfig::default();
        config.harness.command_timeout_secs = MAX_COMMAND_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_applies_to_harness_section() {
        let mut config = StackcheckConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("STACKCHECK_HARNESS_TESTS_DIR", "fixtures") };
        unsafe { std::env::set_var("STACKCHECK_TARGET_HTTP_PORT", "9090") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("STACKCHECK_HARNESS_TESTS_DIR") };
        unsafe { std::env::remove_var("STACKCHECK_TARGET_HTTP_PORT") };
        assert_eq!(config.harness.tests_dir, "fixtures");
        assert_eq!(config.target.http_port, 9090);
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        let mut val = 5u64;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_STACKCHECK_U64_BAD", "five") };
        override_u64(&mut val, "TEST_STACKCHECK_U64_BAD");
        unsafe { std::env::remove_var("TEST_STACKCHECK_U64_BAD") };
        assert_eq!(val, 5);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = StackcheckConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = StackcheckConfig::parse(&toml_str).unwrap();
        assert_eq!(config.harness.commands_dir, parsed.harness.commands_dir);
        assert_eq!(config.target.host, parsed.target.host);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = StackcheckConfig::from_file("/nonexistent/path/stackcheck.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StackcheckError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
