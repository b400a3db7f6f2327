//! 설정 관리 — fixtrace.toml 파싱 및 런타임 설정
//!
//! [`FixtraceConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`FIXTRACE_REPO_CLONE_DIR=/tmp/repos` 형식)
//! 2. 설정 파일 (`fixtrace.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), fixtrace_core::error::FixtraceError> {
//! use fixtrace_core::config::FixtraceConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FixtraceConfig::load("fixtrace.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FixtraceConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FixtraceError};

/// Fixtrace 통합 설정
///
/// `fixtrace.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtraceConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 저장소 마이너 설정
    #[serde(default)]
    pub repo: RepoConfig,
    /// 매칭 엔진 설정
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl FixtraceConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FixtraceError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtraceError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FixtraceError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FixtraceError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FixtraceError> {
        toml::from_str(toml_str).map_err(|e| {
            FixtraceError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FIXTRACE_{SECTION}_{FIELD}`
    /// 예: `FIXTRACE_REPO_GIT_TIMEOUT_SECS=300`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FIXTRACE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FIXTRACE_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "FIXTRACE_GENERAL_DATA_DIR");

        // Repo
        override_string(&mut self.repo.clone_dir, "FIXTRACE_REPO_CLONE_DIR");
        override_u64(
            &mut self.repo.git_timeout_secs,
            "FIXTRACE_REPO_GIT_TIMEOUT_SECS",
        );
        override_usize(&mut self.repo.max_commits, "FIXTRACE_REPO_MAX_COMMITS");
        override_bool(&mut self.repo.cache_enabled, "FIXTRACE_REPO_CACHE_ENABLED");

        // Matcher
        override_f64(
            &mut self.matcher.twin_similarity,
            "FIXTRACE_MATCHER_TWIN_SIMILARITY",
        );
        override_usize(
            &mut self.matcher.twin_min_tokens,
            "FIXTRACE_MATCHER_TWIN_MIN_TOKENS",
        );
        override_usize(
            &mut self.matcher.report_channel_capacity,
            "FIXTRACE_MATCHER_REPORT_CHANNEL_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FixtraceError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.repo.git_timeout_secs == 0 || self.repo.git_timeout_secs > 3600 {
            return Err(ConfigError::InvalidValue {
                field: "repo.git_timeout_secs".to_owned(),
                reason: "must be 1-3600".to_owned(),
            }
            .into());
        }

        if self.repo.max_commits == 0 {
            return Err(ConfigError::InvalidValue {
                field: "repo.max_commits".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if !(0.5..=1.0).contains(&self.matcher.twin_similarity) {
            return Err(ConfigError::InvalidValue {
                field: "matcher.twin_similarity".to_owned(),
                reason: "must be within 0.5-1.0".to_owned(),
            }
            .into());
        }

        if self.matcher.report_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matcher.report_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/fixtrace".to_owned(),
        }
    }
}

/// 저장소 마이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// 로컬 미러를 보관할 디렉토리
    pub clone_dir: String,
    /// git 외부 도구 호출 타임아웃 (초)
    pub git_timeout_secs: u64,
    /// 한 번의 마이닝에서 처리할 최대 커밋 수
    pub max_commits: usize,
    /// 동일한 git 호출의 결과 캐싱 활성화 여부
    pub cache_enabled: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            clone_dir: "/var/lib/fixtrace/repos".to_owned(),
            git_timeout_secs: 120,
            max_commits: 50_000,
            cache_enabled: true,
        }
    }
}

/// 매칭 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// 쌍둥이(twin) 판정 Jaccard 유사도 임계값
    pub twin_similarity: f64,
    /// 쌍둥이 인덱싱 대상이 되기 위한 최소 토큰 수
    pub twin_min_tokens: usize,
    /// 매칭 결과 이벤트 채널 용량
    pub report_channel_capacity: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            twin_similarity: 0.95,
            twin_min_tokens: 10,
            report_channel_capacity: 256,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => *target = true,
            "false" | "0" | "no" => *target = false,
            _ => tracing::warn!(var, value = %value, "ignoring invalid boolean env override"),
        }
    }
}

fn override_u64(target: &mut u64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value = %value, "ignoring invalid integer env override"),
        }
    }
}

fn override_usize(target: &mut usize, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value = %value, "ignoring invalid integer env override"),
        }
    }
}

fn override_f64(target: &mut f64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var, value = %value, "ignoring invalid float env override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FixtraceConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn default_values() {
        let config = FixtraceConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.repo.git_timeout_secs, 120);
        assert_eq!(config.repo.max_commits, 50_000);
        assert!(config.repo.cache_enabled);
        assert_eq!(config.matcher.twin_similarity, 0.95);
        assert_eq!(config.matcher.twin_min_tokens, 10);
    }

    #[test]
    fn parse_partial_toml_uses_defaults() {
        let config = FixtraceConfig::parse(
            r#"
[repo]
git_timeout_secs = 300
"#,
        )
        .unwrap();
        assert_eq!(config.repo.git_timeout_secs, 300);
        // 나머지 필드는 기본값
        assert_eq!(config.repo.clone_dir, "/var/lib/fixtrace/repos");
        assert_eq!(config.matcher.twin_similarity, 0.95);
    }

    #[test]
    fn parse_invalid_toml_fails() {
        let result = FixtraceConfig::parse("not [valid toml");
        assert!(matches!(
            result,
            Err(FixtraceError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = FixtraceConfig::default();
        config.general.log_level = "verbose".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = FixtraceConfig::default();
        config.repo.git_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_excessive_timeout() {
        let mut config = FixtraceConfig::default();
        config.repo.git_timeout_secs = 7200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_commits() {
        let mut config = FixtraceConfig::default();
        config.repo.max_commits = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_similarity() {
        let mut config = FixtraceConfig::default();
        config.matcher.twin_similarity = 0.3;
        assert!(config.validate().is_err());

        config.matcher.twin_similarity = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_boundary_similarity() {
        let mut config = FixtraceConfig::default();
        config.matcher.twin_similarity = 0.5;
        config.validate().unwrap();
        config.matcher.twin_similarity = 1.0;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_channel_capacity() {
        let mut config = FixtraceConfig::default();
        config.matcher.report_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn from_file_missing_returns_file_not_found() {
        let result = FixtraceConfig::from_file("/nonexistent/fixtrace.toml").await;
        assert!(matches!(
            result,
            Err(FixtraceError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtrace.toml");
        tokio::fs::write(
            &path,
            r#"
[general]
log_level = "debug"

[matcher]
twin_similarity = 0.9
"#,
        )
        .await
        .unwrap();

        let config = FixtraceConfig::from_file(&path).await.unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.matcher.twin_similarity, 0.9);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = FixtraceConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = FixtraceConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.repo.git_timeout_secs, config.repo.git_timeout_secs);
        assert_eq!(parsed.matcher.twin_similarity, config.matcher.twin_similarity);
    }
}
