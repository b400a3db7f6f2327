//! 매칭 엔진 에러 타입
//!
//! [`MatchEngineError`]는 매칭 엔진 모듈 내에서 발생할 수 있는 모든 에러를
//! 나타냅니다. `From<MatchEngineError> for FixtraceError` 구현을 통해
//! `?` 연산자로 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! 개별 규칙의 평가 실패는 실행을 중단시키지 않습니다 — 엔진이
//! 단계 경계에서 포착하여 "매칭 안 됨"으로 처리합니다.

use fixtrace_core::error::{ConfigError, FixtraceError, MatchError};

/// 매칭 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum MatchEngineError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 개별 규칙 평가 실패
    #[error("rule '{rule_id}' failed on commit {commit_id}: {reason}")]
    Rule {
        /// 실패한 규칙 ID
        rule_id: String,
        /// 평가 중이던 커밋 해시
        commit_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<MatchEngineError> for FixtraceError {
    fn from(err: MatchEngineError) -> Self {
        match err {
            MatchEngineError::Config { field, reason } => {
                FixtraceError::Config(ConfigError::InvalidValue { field, reason })
            }
            MatchEngineError::Rule {
                rule_id,
                commit_id,
                reason,
            } => FixtraceError::Match(MatchError::Rule {
                rule_id,
                commit_id,
                reason,
            }),
            MatchEngineError::Channel(msg) => FixtraceError::Match(MatchError::ChannelSend(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = MatchEngineError::Config {
            field: "twin_similarity".to_owned(),
            reason: "must be within 0.5-1.0".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("twin_similarity"));
        assert!(msg.contains("0.5-1.0"));
    }

    #[test]
    fn rule_error_display() {
        let err = MatchEngineError::Rule {
            rule_id: "SEC_KEYWORDS_IN_MSG".to_owned(),
            commit_id: "abcd1234".to_owned(),
            reason: "boom".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SEC_KEYWORDS_IN_MSG"));
        assert!(msg.contains("abcd1234"));
    }

    #[test]
    fn converts_config_to_fixtrace_error() {
        let err = MatchEngineError::Config {
            field: "x".to_owned(),
            reason: "y".to_owned(),
        };
        let top: FixtraceError = err.into();
        assert!(matches!(
            top,
            FixtraceError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn converts_rule_to_fixtrace_error() {
        let err = MatchEngineError::Rule {
            rule_id: "r".to_owned(),
            commit_id: "c".to_owned(),
            reason: "x".to_owned(),
        };
        let top: FixtraceError = err.into();
        assert!(matches!(top, FixtraceError::Match(MatchError::Rule { .. })));
    }

    #[test]
    fn converts_channel_to_fixtrace_error() {
        let err = MatchEngineError::Channel("closed".to_owned());
        let top: FixtraceError = err.into();
        assert!(matches!(
            top,
            FixtraceError::Match(MatchError::ChannelSend(_))
        ));
    }
}
