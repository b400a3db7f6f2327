//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `fixtrace_`
//! - 모듈명: `repo_miner_`, `match_engine_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 규칙 ID 레이블 키
pub const LABEL_RULE: &str = "rule";

/// 단계명 레이블 키 (structural, textual, twins)
pub const LABEL_PHASE: &str = "phase";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Repo Miner 메트릭 ─────────────────────────────────────────────

/// Repo Miner: 실행된 git 명령 수 (counter, label: result)
pub const REPO_MINER_GIT_COMMANDS_TOTAL: &str = "fixtrace_repo_miner_git_commands_total";

/// Repo Miner: 명령 캐시 적중 수 (counter)
pub const REPO_MINER_CACHE_HITS_TOTAL: &str = "fixtrace_repo_miner_cache_hits_total";

/// Repo Miner: 수행된 clone 수 (counter)
pub const REPO_MINER_CLONES_TOTAL: &str = "fixtrace_repo_miner_clones_total";

/// Repo Miner: 추출된 커밋 수 (counter)
pub const REPO_MINER_COMMITS_EXTRACTED_TOTAL: &str = "fixtrace_repo_miner_commits_extracted_total";

/// Repo Miner: 추출 실패로 건너뛴 커밋 수 (counter)
pub const REPO_MINER_COMMITS_SKIPPED_TOTAL: &str = "fixtrace_repo_miner_commits_skipped_total";

// ─── Match Engine 메트릭 ───────────────────────────────────────────

/// Match Engine: 완료된 매칭 실행 수 (counter)
pub const MATCH_ENGINE_RUNS_COMPLETED_TOTAL: &str = "fixtrace_match_engine_runs_completed_total";

/// Match Engine: 규칙 매칭 수 (counter, label: rule)
pub const MATCH_ENGINE_RULE_MATCHES_TOTAL: &str = "fixtrace_match_engine_rule_matches_total";

/// Match Engine: 탐지된 쌍둥이 연결 수 (counter)
pub const MATCH_ENGINE_TWIN_LINKS_TOTAL: &str = "fixtrace_match_engine_twin_links_total";

/// Match Engine: 마지막 실행에서 순위가 매겨진 후보 수 (gauge)
pub const MATCH_ENGINE_CANDIDATES_RANKED: &str = "fixtrace_match_engine_candidates_ranked";

/// Match Engine: 단계별 소요 시간 (histogram, 초, label: phase)
pub const MATCH_ENGINE_PHASE_DURATION_SECONDS: &str =
    "fixtrace_match_engine_phase_duration_seconds";

/// Match Engine: 매칭 실행 전체 소요 시간 (histogram, 초)
pub const MATCH_ENGINE_RUN_DURATION_SECONDS: &str = "fixtrace_match_engine_run_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 단계 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위, 규칙 평가는 빠르지만 twin 인덱스 구축이 상대적으로 느림
pub const PHASE_DURATION_BUCKETS: [f64; 9] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0, 60.0];

/// 매칭 실행 소요 시간 히스토그램 버킷 (초)
///
/// 100ms ~ 600s 범위 (clone과 커밋 추출은 디스크/네트워크 I/O 포함)
pub const RUN_DURATION_BUCKETS: [f64; 9] = [0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 임베딩하는 데몬의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Repo Miner
    describe_counter!(
        REPO_MINER_GIT_COMMANDS_TOTAL,
        "Total number of git commands executed"
    );
    describe_counter!(
        REPO_MINER_CACHE_HITS_TOTAL,
        "Total number of git command cache hits"
    );
    describe_counter!(
        REPO_MINER_CLONES_TOTAL,
        "Total number of repository clones performed"
    );
    describe_counter!(
        REPO_MINER_COMMITS_EXTRACTED_TOTAL,
        "Total number of commits fully extracted"
    );
    describe_counter!(
        REPO_MINER_COMMITS_SKIPPED_TOTAL,
        "Total number of commits skipped due to extraction failures"
    );

    // Match Engine
    describe_counter!(
        MATCH_ENGINE_RUNS_COMPLETED_TOTAL,
        "Total number of advisory matching runs completed"
    );
    describe_counter!(
        MATCH_ENGINE_RULE_MATCHES_TOTAL,
        "Total number of rule matches across all runs"
    );
    describe_counter!(
        MATCH_ENGINE_TWIN_LINKS_TOTAL,
        "Total number of twin links detected between candidates"
    );
    describe_gauge!(
        MATCH_ENGINE_CANDIDATES_RANKED,
        "Number of candidates ranked in the most recent run"
    );
    describe_histogram!(
        MATCH_ENGINE_PHASE_DURATION_SECONDS,
        "Time spent in a single rule phase in seconds"
    );
    describe_histogram!(
        MATCH_ENGINE_RUN_DURATION_SECONDS,
        "Time to complete a full matching run in seconds"
    );
}
