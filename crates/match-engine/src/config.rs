//! 매칭 엔진 설정
//!
//! [`MatchEngineConfig`]는 core의 [`MatcherConfig`](fixtrace_core::config::MatcherConfig)를
//! 확장하여 엔진 고유 설정(강한 매칭 임계값 등)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use fixtrace_match_engine::MatchEngineConfig;
//!
//! let config = MatchEngineConfig::default();
//! config.validate().unwrap();
//!
//! use fixtrace_match_engine::MatchEngineConfigBuilder;
//!
//! let config = MatchEngineConfigBuilder::new()
//!     .twin_similarity(0.9)
//!     .twin_min_tokens(20)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MatchEngineError;

/// 매칭 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEngineConfig {
    /// 쌍둥이 판정 Jaccard 유사도 임계값
    pub twin_similarity: f64,
    /// 쌍둥이 인덱싱 대상이 되기 위한 최소 고유 토큰 수
    ///
    /// 빈 diff나 극히 작은 diff는 모든 것과 충돌하므로 인덱스에서 제외됩니다.
    pub twin_min_tokens: usize,
    /// "강한 매칭"으로 간주하는 관련도 하한 (쌍둥이 전파 규칙에 사용)
    pub strong_match_relevance: u32,
    /// 매칭 결과 이벤트 채널 용량
    pub report_channel_capacity: usize,
}

impl Default for MatchEngineConfig {
    fn default() -> Self {
        Self {
            twin_similarity: 0.95,
            twin_min_tokens: 10,
            strong_match_relevance: 32,
            report_channel_capacity: 256,
        }
    }
}

impl MatchEngineConfig {
    /// core의 `MatcherConfig`에서 엔진 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &fixtrace_core::config::MatcherConfig) -> Self {
        Self {
            twin_similarity: core.twin_similarity,
            twin_min_tokens: core.twin_min_tokens,
            report_channel_capacity: core.report_channel_capacity,
            ..Self::default()
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `twin_similarity`: 0.5-1.0
    /// - `twin_min_tokens`: 1 이상
    /// - `strong_match_relevance`: 1 이상
    /// - `report_channel_capacity`: 1 이상
    pub fn validate(&self) -> Result<(), MatchEngineError> {
        if !(0.5..=1.0).contains(&self.twin_similarity) {
            return Err(MatchEngineError::Config {
                field: "twin_similarity".to_owned(),
                reason: "must be within 0.5-1.0".to_owned(),
            });
        }

        if self.twin_min_tokens == 0 {
            return Err(MatchEngineError::Config {
                field: "twin_min_tokens".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.strong_match_relevance == 0 {
            return Err(MatchEngineError::Config {
                field: "strong_match_relevance".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.report_channel_capacity == 0 {
            return Err(MatchEngineError::Config {
                field: "report_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`MatchEngineConfig`] 빌더
#[derive(Default)]
pub struct MatchEngineConfigBuilder {
    config: MatchEngineConfig,
}

impl MatchEngineConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 쌍둥이 유사도 임계값을 설정합니다.
    pub fn twin_similarity(mut self, threshold: f64) -> Self {
        self.config.twin_similarity = threshold;
        self
    }

    /// 쌍둥이 인덱싱 최소 토큰 수를 설정합니다.
    pub fn twin_min_tokens(mut self, min: usize) -> Self {
        self.config.twin_min_tokens = min;
        self
    }

    /// 강한 매칭 관련도 하한을 설정합니다.
    pub fn strong_match_relevance(mut self, relevance: u32) -> Self {
        self.config.strong_match_relevance = relevance;
        self
    }

    /// 결과 채널 용량을 설정합니다.
    pub fn report_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.report_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `MatchEngineError::Config` 반환
    pub fn build(self) -> Result<MatchEngineConfig, MatchEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
