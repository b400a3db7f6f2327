//! 저장소 마이너 에러 타입
//!
//! [`RepoMinerError`]는 마이닝 모듈 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<RepoMinerError> for FixtraceError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **설정**: `Config` — 절대 경로가 아니거나 존재하지 않는 작업 디렉토리 등
//! - **외부 도구**: `Tool`, `Timeout` — git 프로세스 실패/데드라인 초과
//! - **저장소 접근**: `Unavailable` — clone 중 네트워크/인증 실패
//! - **태그 해석**: `NoMatchingTag` — 버전 경계를 태그로 bound할 수 없음
//! - **출력 파싱**: `Parse`
//! - **파일 I/O**: `Io`

use fixtrace_core::error::{ConfigError, FixtraceError, RepoError};

/// 저장소 마이너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RepoMinerError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// git 명령이 0이 아닌 종료 코드로 실패
    #[error("git command failed: {command}: exit code {exit_code}: {stderr}")]
    Tool {
        /// 실행한 명령 (인자 포함)
        command: String,
        /// 종료 코드
        exit_code: i32,
        /// 캡처된 stderr
        stderr: String,
    },

    /// git 명령이 데드라인을 초과
    #[error("git command timed out: {command}: after {timeout_secs}s")]
    Timeout {
        /// 실행한 명령 (인자 포함)
        command: String,
        /// 설정된 데드라인 (초)
        timeout_secs: u64,
    },

    /// 저장소 접근 불가 (clone 실패)
    #[error("repository unavailable: {url}: {reason}")]
    Unavailable {
        /// 저장소 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// 요청된 버전 경계와 비교 가능한 태그가 없음
    #[error("no matching tag for version '{bound}' in interval '{interval}'")]
    NoMatchingTag {
        /// 해석에 실패한 경계 버전
        bound: String,
        /// 원본 버전 구간
        interval: String,
    },

    /// git 출력 파싱 실패
    #[error("git output parse failed: {0}")]
    Parse(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<RepoMinerError> for FixtraceError {
    fn from(err: RepoMinerError) -> Self {
        match err {
            RepoMinerError::Config { field, reason } => {
                FixtraceError::Config(ConfigError::InvalidValue { field, reason })
            }
            RepoMinerError::Tool {
                command,
                exit_code,
                stderr,
            } => FixtraceError::Repo(RepoError::Tool {
                command,
                exit_code,
                stderr,
            }),
            RepoMinerError::Timeout {
                command,
                timeout_secs,
            } => FixtraceError::Repo(RepoError::Timeout {
                command,
                timeout_secs,
            }),
            RepoMinerError::Unavailable { url, reason } => {
                FixtraceError::Repo(RepoError::Unavailable { url, reason })
            }
            RepoMinerError::NoMatchingTag { bound, interval } => {
                FixtraceError::Repo(RepoError::NoMatchingTag { bound, interval })
            }
            RepoMinerError::Parse(msg) => FixtraceError::Repo(RepoError::Parse(msg)),
            RepoMinerError::Io { path, source } => {
                FixtraceError::Repo(RepoError::Parse(format!("io error: {path}: {source}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_display() {
        let err = RepoMinerError::Tool {
            command: "git rev-list v1..v2".to_owned(),
            exit_code: 128,
            stderr: "fatal: bad revision 'v1..v2'".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("git rev-list v1..v2"));
        assert!(msg.contains("exit code 128"));
        assert!(msg.contains("bad revision"));
    }

    #[test]
    fn timeout_error_display() {
        let err = RepoMinerError::Timeout {
            command: "git clone https://example.com/big".to_owned(),
            timeout_secs: 60,
        };
        assert!(err.to_string().contains("after 60s"));
    }

    #[test]
    fn unavailable_error_display() {
        let err = RepoMinerError::Unavailable {
            url: "https://example.com/repo.git".to_owned(),
            reason: "could not resolve host".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("repo.git"));
        assert!(msg.contains("resolve host"));
    }

    #[test]
    fn no_matching_tag_display() {
        let err = RepoMinerError::NoMatchingTag {
            bound: "9.9".to_owned(),
            interval: "9.9:10.0".to_owned(),
        };
        assert!(err.to_string().contains("'9.9'"));
    }

    #[test]
    fn converts_config_to_fixtrace_config_error() {
        let err = RepoMinerError::Config {
            field: "clone_dir".to_owned(),
            reason: "must be absolute".to_owned(),
        };
        let top: FixtraceError = err.into();
        assert!(matches!(
            top,
            FixtraceError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn converts_tool_to_fixtrace_repo_error() {
        let err = RepoMinerError::Tool {
            command: "git show".to_owned(),
            exit_code: 1,
            stderr: String::new(),
        };
        let top: FixtraceError = err.into();
        assert!(matches!(top, FixtraceError::Repo(RepoError::Tool { .. })));
    }

    #[test]
    fn converts_no_matching_tag_to_fixtrace_repo_error() {
        let err = RepoMinerError::NoMatchingTag {
            bound: "1.0".to_owned(),
            interval: "1.0:2.0".to_owned(),
        };
        let top: FixtraceError = err.into();
        assert!(matches!(
            top,
            FixtraceError::Repo(RepoError::NoMatchingTag { .. })
        ));
    }
}
