//! 저장소 마이너 설정
//!
//! [`RepoMinerConfig`]는 core의 [`RepoConfig`](fixtrace_core::config::RepoConfig)에서
//! 파생되며, 마이닝 고유 설정을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use fixtrace_repo_miner::RepoMinerConfig;
//!
//! // 기본값으로 생성
//! let config = RepoMinerConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use fixtrace_repo_miner::RepoMinerConfigBuilder;
//!
//! let config = RepoMinerConfigBuilder::new()
//!     .git_timeout_secs(300)
//!     .max_commits(10_000)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RepoMinerError;

/// 설정 상한값 상수
const MAX_GIT_TIMEOUT_SECS: u64 = 3600; // 1 hour
const MAX_COMMITS_LIMIT: usize = 1_000_000;

/// 저장소 마이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMinerConfig {
    /// 로컬 미러를 보관할 디렉토리
    pub clone_dir: String,
    /// git 명령 타임아웃 (초)
    pub git_timeout_secs: u64,
    /// 한 번의 마이닝에서 처리할 최대 커밋 수
    pub max_commits: usize,
    /// 동일 git 호출 결과 캐싱 활성화 여부
    pub cache_enabled: bool,
}

impl Default for RepoMinerConfig {
    fn default() -> Self {
        Self {
            clone_dir: "/var/lib/fixtrace/repos".to_owned(),
            git_timeout_secs: 120,
            max_commits: 50_000,
            cache_enabled: true,
        }
    }
}

impl RepoMinerConfig {
    /// core의 `RepoConfig`에서 마이너 설정을 생성합니다.
    pub fn from_core(core: &fixtrace_core::config::RepoConfig) -> Self {
        Self {
            clone_dir: core.clone_dir.clone(),
            git_timeout_secs: core.git_timeout_secs,
            max_commits: core.max_commits,
            cache_enabled: core.cache_enabled,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `clone_dir`: 비어있으면 안 되고, `..` 경로 순회 패턴 금지
    /// - `git_timeout_secs`: 1-3600
    /// - `max_commits`: 1-1000000
    pub fn validate(&self) -> Result<(), RepoMinerError> {
        if self.clone_dir.is_empty() {
            return Err(RepoMinerError::Config {
                field: "clone_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if std::path::Path::new(&self.clone_dir)
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(RepoMinerError::Config {
                field: "clone_dir".to_owned(),
                reason: format!(
                    "clone directory '{}' contains path traversal pattern '..'",
                    self.clone_dir
                ),
            });
        }

        if self.git_timeout_secs == 0 || self.git_timeout_secs > MAX_GIT_TIMEOUT_SECS {
            return Err(RepoMinerError::Config {
                field: "git_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_GIT_TIMEOUT_SECS}"),
            });
        }

        if self.max_commits == 0 || self.max_commits > MAX_COMMITS_LIMIT {
            return Err(RepoMinerError::Config {
                field: "max_commits".to_owned(),
                reason: format!("must be 1-{MAX_COMMITS_LIMIT}"),
            });
        }

        Ok(())
    }
}

/// [`RepoMinerConfig`] 빌더
#[derive(Default)]
pub struct RepoMinerConfigBuilder {
    config: RepoMinerConfig,
}

impl RepoMinerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// clone 디렉토리를 설정합니다.
    pub fn clone_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.clone_dir = dir.into();
        self
    }

    /// git 타임아웃(초)을 설정합니다.
    pub fn git_timeout_secs(mut self, secs: u64) -> Self {
        self.config.git_timeout_secs = secs;
        self
    }

    /// 최대 커밋 수를 설정합니다.
    pub fn max_commits(mut self, max: usize) -> Self {
        self.config.max_commits = max;
        self
    }

    /// 명령 캐싱 여부를 설정합니다.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `RepoMinerError::Config` 반환
    pub fn build(self) -> Result<RepoMinerConfig, RepoMinerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
