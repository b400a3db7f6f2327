//! 에러 타입 — 도메인별 에러 정의

/// Fixtrace 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FixtraceError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 저장소 마이닝 에러
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),

    /// 매칭 엔진 에러
    #[error("match error: {0}")]
    Match(#[from] MatchError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 저장소 마이닝 에러
///
/// git 외부 도구 호출과 태그 해석에서 발생하는 에러를 나타냅니다.
/// 커밋 단위 추출 실패는 마이닝 중 포착되어 해당 커밋만 건너뜁니다.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// 외부 도구가 0이 아닌 종료 코드로 실패
    #[error("git command failed: {command}: exit code {exit_code}: {stderr}")]
    Tool {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// 외부 도구 호출이 데드라인을 초과
    #[error("git command timed out: {command}: after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// 저장소 접근 불가 (네트워크/인증 실패)
    #[error("repository unavailable: {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// 버전 구간을 태그로 해석할 수 없음
    #[error("no matching tag for version '{bound}' in interval '{interval}'")]
    NoMatchingTag { bound: String, interval: String },

    /// 외부 도구 출력 파싱 실패
    #[error("git output parse failed: {0}")]
    Parse(String),
}

/// 매칭 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// 개별 규칙 평가 실패
    #[error("rule '{rule_id}' failed on commit {commit_id}: {reason}")]
    Rule {
        rule_id: String,
        commit_id: String,
        reason: String,
    },

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 엔진 초기화 실패
    #[error("engine init failed: {0}")]
    InitFailed(String),
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 파이프라인을 다시 시작
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 파이프라인을 정지
    #[error("pipeline not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}
