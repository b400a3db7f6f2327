//! 규칙 엔진 — 단계 순차 실행 및 실패 격리
//!
//! 매칭 실행 하나의 상태 기계는
//! `NotStarted → Running(phase) → Complete`입니다.
//! 각 단계는 진입 시 일회성 준비 작업(쌍둥이 인덱스 구축 등)을 수행한 뒤
//! 모든 후보에 모든 규칙을 적용합니다.
//!
//! 개별 규칙의 실패는 규칙 ID와 커밋 ID를 로그로 남기고 "매칭 안 됨"으로
//! 처리합니다 — 휴리스틱 하나가 잘못되어도 실행 전체가 무효가 되지
//! 않습니다. 뒤 단계는 앞 단계가 남긴 주석을 읽을 수 있습니다.

use std::collections::HashMap;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, warn};

use fixtrace_core::metrics as m;
use fixtrace_core::stats::ExecutionStats;
use fixtrace_core::types::AdvisoryRecord;

use crate::candidate::Candidate;
use crate::config::MatchEngineConfig;
use crate::rules::{Phase, PhaseContext, PhaseSetup, default_phases};
use crate::twins::{MinHashSignature, TwinIndex, content_tokens};

/// 매칭 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// 아직 시작하지 않음
    NotStarted,
    /// i번째 단계 실행 중
    Running(usize),
    /// 모든 단계 완료
    Complete,
}

/// 규칙 엔진 — 매칭 실행 하나에 귀속됩니다.
///
/// 쌍둥이 인덱스 같은 단계 공유 상태를 포함하므로 동시 실행 간에
/// 공유하면 안 됩니다. 실행마다 새로 생성하세요.
pub struct RuleEngine {
    phases: Vec<Phase>,
    state: EngineState,
    twin_similarity: f64,
    twin_min_tokens: usize,
}

impl RuleEngine {
    /// 기본 단계 구성으로 엔진을 생성합니다.
    pub fn new(config: &MatchEngineConfig) -> Self {
        Self::with_phases(config, default_phases(config))
    }

    /// 사용자 정의 단계 구성으로 엔진을 생성합니다.
    pub fn with_phases(config: &MatchEngineConfig, phases: Vec<Phase>) -> Self {
        Self {
            phases,
            state: EngineState::NotStarted,
            twin_similarity: config.twin_similarity,
            twin_min_tokens: config.twin_min_tokens,
        }
    }

    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// 단계 수를 반환합니다.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// 전체 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.phases.iter().map(|p| p.rules.len()).sum()
    }

    /// 모든 단계를 선언 순서대로 실행합니다.
    ///
    /// 후보별 규칙 적용은 단계 진입 시점의 스냅샷에만 의존하므로
    /// 처리 순서와 무관합니다. 규칙이 매칭되면 주석이 정확히 한 번
    /// 기록되고 관련도가 가중치만큼 증가합니다.
    pub fn run(
        &mut self,
        candidates: &mut [Candidate],
        advisory: &AdvisoryRecord,
        stats: &mut ExecutionStats,
    ) {
        for phase_idx in 0..self.phases.len() {
            self.state = EngineState::Running(phase_idx);
            let phase_started = Instant::now();
            let phase_name = self.phases[phase_idx].name;
            debug!(phase = phase_name, "phase started");

            // 단계 준비 작업
            if self.phases[phase_idx].setup == PhaseSetup::TwinIndex {
                self.link_twins(candidates, stats);
            }

            // 앞 단계까지의 관련도 스냅샷 — 단계 내 처리 순서 독립성 보장
            let snapshot: HashMap<String, u32> = candidates
                .iter()
                .map(|c| (c.commit_id().to_owned(), c.relevance()))
                .collect();
            let ctx = PhaseContext {
                relevance_by_commit: &snapshot,
            };

            let phase = &self.phases[phase_idx];
            let mut matches_by_rule: HashMap<&'static str, u64> =
                phase.rules.iter().map(|r| (r.id, 0)).collect();

            for candidate in candidates.iter_mut() {
                for rule in &phase.rules {
                    match rule.apply(candidate, advisory, &ctx) {
                        Ok(Some(explanation)) => {
                            if candidate.annotate(rule.id, rule.weight, explanation) {
                                *matches_by_rule.entry(rule.id).or_default() += 1;
                                counter!(
                                    m::MATCH_ENGINE_RULE_MATCHES_TOTAL,
                                    m::LABEL_RULE => rule.id
                                )
                                .increment(1);
                            } else {
                                warn!(
                                    rule = rule.id,
                                    commit = candidate.commit_id(),
                                    "duplicate annotation suppressed"
                                );
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            // 규칙 하나의 실패는 실행을 중단시키지 않는다
                            warn!(
                                rule = rule.id,
                                commit = candidate.commit_id(),
                                error = %e,
                                "rule application failed, treating as no match"
                            );
                        }
                    }
                }
            }

            let mut rule_ids: Vec<&'static str> = matches_by_rule.keys().copied().collect();
            rule_ids.sort_unstable();
            for rule_id in rule_ids {
                stats.record(
                    &format!("phase.{phase_name}.rule.{rule_id}.matches"),
                    matches_by_rule[rule_id] as f64,
                );
            }

            let elapsed = phase_started.elapsed();
            stats.append_duration(&format!("phase.{phase_name}.duration_ms"), elapsed);
            histogram!(
                m::MATCH_ENGINE_PHASE_DURATION_SECONDS,
                m::LABEL_PHASE => phase_name
            )
            .record(elapsed.as_secs_f64());
            debug!(phase = phase_name, elapsed_ms = elapsed.as_millis() as u64, "phase done");
        }

        self.state = EngineState::Complete;
    }

    /// 쌍둥이 인덱스를 구축하고 각 후보에 쌍둥이 링크를 기록합니다.
    ///
    /// 빈 diff거나 고유 토큰이 최소치에 못 미치는 후보는 인덱싱하지
    /// 않습니다 — 퇴화한 시그니처는 모든 것과 충돌합니다.
    fn link_twins(&self, candidates: &mut [Candidate], stats: &mut ExecutionStats) {
        let mut index = TwinIndex::new(self.twin_similarity);

        for candidate in candidates.iter_mut() {
            let tokens = content_tokens(&candidate.commit.message, &candidate.commit.diff);
            if candidate.commit.diff.is_empty() || tokens.len() < self.twin_min_tokens {
                continue;
            }
            let signature = MinHashSignature::compute(&tokens);
            index.insert(candidate.commit_id().to_owned(), signature.clone());
            candidate.signature = Some(signature);
        }

        let mut links = 0u64;
        for candidate in candidates.iter_mut() {
            if let Some(signature) = candidate.signature.clone() {
                candidate.twins = index.query_twins(&signature, candidate.commit_id());
                links += candidate.twins.len() as u64;
            }
        }

        stats.record("twins.indexed", index.len() as f64);
        stats.record("twins.links", links as f64);
        counter!(m::MATCH_ENGINE_TWIN_LINKS_TOTAL).increment(links);
        debug!(indexed = index.len(), links, "twin index built");
    }
}
