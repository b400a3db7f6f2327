//! 매칭 결과 — 다운스트림 협력자가 그대로 소비하는 레코드
//!
//! [`MatchReport`]는 매칭 실행 하나의 전체 산출물입니다. 리포트 렌더러와
//! 스토리지 협력자는 추가 계산 없이 이 레코드를 소비합니다.
//! 모든 타입은 serde 직렬화가 가능합니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use fixtrace_core::types::Hunk;

use crate::candidate::{Annotation, Candidate};

/// 순위가 매겨진 후보 하나 (출력 레코드)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 커밋 해시
    pub commit_id: String,
    /// 저장소 URL
    pub repository_url: String,
    /// 커밋 메시지
    pub message: String,
    /// 통합 diff
    pub diff: String,
    /// 변경 파일 목록
    pub changed_files: Vec<String>,
    /// 헌크 목록
    pub hunks: Vec<Hunk>,
    /// 누적 관련도
    pub relevance: u32,
    /// 매칭된 규칙 주석 (기록 순서 유지)
    pub annotations: Vec<Annotation>,
    /// 쌍둥이 커밋 ID
    pub twins: Vec<String>,
}

impl From<&Candidate> for RankedCandidate {
    fn from(candidate: &Candidate) -> Self {
        Self {
            commit_id: candidate.commit.commit_id.clone(),
            repository_url: candidate.commit.repository_url.clone(),
            message: candidate.commit.message.clone(),
            diff: candidate.commit.diff.clone(),
            changed_files: candidate.commit.changed_files.clone(),
            hunks: candidate.commit.hunks.clone(),
            relevance: candidate.relevance(),
            annotations: candidate.annotations().to_vec(),
            twins: candidate.twins.clone(),
        }
    }
}

impl fmt::Display for RankedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} relevance={} rules=[{}]",
            &self.commit_id[..8.min(self.commit_id.len())],
            self.relevance,
            self.annotations
                .iter()
                .map(|a| a.rule_id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// 매칭 실행 하나의 전체 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// 실행 고유 ID
    pub run_id: String,
    /// 어드바이저리 ID
    pub advisory_id: String,
    /// 저장소 URL
    pub repository_url: String,
    /// 관련도 내림차순으로 정렬된 후보 목록
    pub candidates: Vec<RankedCandidate>,
    /// 추출 실패로 건너뛴 커밋 수
    pub commits_skipped: usize,
    /// 태그 해석에 실패하여 전체 히스토리로 폴백했는지 여부
    pub full_history_fallback: bool,
    /// 단계/규칙별 실행 통계 (중첩 JSON 트리)
    pub stats: serde_json::Value,
    /// 실행 완료 시각
    pub completed_at: SystemTime,
}

impl MatchReport {
    /// 관련도가 0보다 큰 후보 수를 반환합니다.
    pub fn relevant_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.relevance > 0).count()
    }

    /// 최상위 후보를 반환합니다.
    pub fn top_candidate(&self) -> Option<&RankedCandidate> {
        self.candidates.first()
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}: {} candidate(s), {} relevant, {} skipped",
            self.advisory_id,
            self.repository_url,
            self.candidates.len(),
            self.relevant_count(),
            self.commits_skipped,
        )
    }
}
