//! 매칭 오케스트레이터 — 전체 매칭 흐름 관리
//!
//! [`FixMatcher`]는 core의 [`Pipeline`] trait을 구현하여 임베딩하는
//! 데몬에서 다른 모듈과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! AdvisoryRecord + repo URL
//!        |
//!   enrich (code tokens, relevant paths)
//!        |
//!   Repository::open_or_clone --> tags --> resolve_interval
//!        |                                     | (NoMatchingTag: 전체 히스토리 폴백)
//!   commits_in_range --> load_commits (부분 실패 허용)
//!        |
//!   Candidate 전처리 --> RuleEngine (structural -> textual -> twins)
//!        |
//!   rank --> MatchReport
//!        |
//!   mpsc --> downstream (리포트/스토리지 협력자)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tracing::{info, warn};

use fixtrace_core::error::{FixtraceError, MatchError};
use fixtrace_core::metrics as m;
use fixtrace_core::pipeline::{HealthStatus, Pipeline};
use fixtrace_core::stats::ExecutionStats;
use fixtrace_core::types::AdvisoryRecord;
use fixtrace_repo_miner::{
    MiningReport, RepoMinerConfig, RepoMinerError, Repository, ResolvedInterval, resolve_interval,
};

use crate::advisory;
use crate::candidate::Candidate;
use crate::config::MatchEngineConfig;
use crate::engine::RuleEngine;
use crate::error::MatchEngineError;
use crate::event::MatchEvent;
use crate::rank;
use crate::report::{MatchReport, RankedCandidate};

/// 매처 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum MatcherState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 매칭 오케스트레이터
///
/// 저장소 마이닝, 태그 해석, 후보 전처리, 규칙 엔진 실행, 랭킹,
/// 결과 이벤트 전송의 전체 흐름을 관리합니다.
///
/// 쌍둥이 인덱스와 실행 통계는 실행마다 새로 만들어지므로
/// [`match_advisory`](FixMatcher::match_advisory)는 동시에 여러 번
/// 호출해도 안전합니다.
pub struct FixMatcher {
    /// 엔진 설정
    config: MatchEngineConfig,
    /// 저장소 마이너 설정
    repo_config: RepoMinerConfig,
    /// 현재 상태
    state: MatcherState,
    /// 결과 이벤트 전송 채널
    report_tx: mpsc::Sender<MatchEvent>,
    /// 완료된 매칭 실행 수
    runs_completed: Arc<AtomicU64>,
}

impl FixMatcher {
    /// 현재 상태명을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            MatcherState::Initialized => "initialized",
            MatcherState::Running => "running",
            MatcherState::Stopped => "stopped",
        }
    }

    /// 완료된 매칭 실행 수를 반환합니다.
    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    /// 어드바이저리 하나를 저장소와 대조하여 후보 순위를 만듭니다.
    ///
    /// # 동작
    ///
    /// 1. 어드바이저리 intake 보강 (코드 토큰, 관련 경로)
    /// 2. 저장소 open/clone, 태그 해석 (실패 시 전체 히스토리 폴백)
    /// 3. 커밋 추출 (개별 실패는 건너뛰고 집계)
    /// 4. 규칙 엔진 실행, 랭킹
    /// 5. `MatchReport` 반환 + `MatchEvent` 전송
    pub async fn match_advisory(
        &self,
        mut advisory: AdvisoryRecord,
        repo_url: &str,
    ) -> Result<MatchReport, FixtraceError> {
        let started = Instant::now();
        let mut stats = ExecutionStats::new();

        advisory::enrich(&mut advisory);
        info!(
            advisory = %advisory.vuln_id,
            repo = repo_url,
            interval = %advisory.interval,
            "matching run started"
        );

        // 마이닝은 블로킹 I/O (git 서브프로세스) — spawn_blocking으로 감싼다
        let repo_config = self.repo_config.clone();
        let url = repo_url.to_owned();
        let interval = advisory.interval.clone();
        let (mining, fallback) = tokio::task::spawn_blocking(
            move || -> Result<(MiningReport, bool), RepoMinerError> {
                let repo = Repository::open_or_clone(&url, &repo_config)?;
                let tags = repo.tags()?;

                let (resolved, fallback) = match resolve_interval(&interval, &tags) {
                    Ok(resolved) => (resolved, false),
                    Err(RepoMinerError::NoMatchingTag { bound, interval }) => {
                        warn!(
                            %bound,
                            %interval,
                            "could not bound version interval, scanning full history"
                        );
                        (
                            ResolvedInterval {
                                from_tag: None,
                                to_tag: None,
                            },
                            true,
                        )
                    }
                    Err(e) => return Err(e),
                };

                let ids = repo.commits_in_range(
                    resolved.from_tag.as_deref(),
                    resolved.to_tag.as_deref(),
                    repo_config.max_commits,
                )?;
                Ok((repo.load_commits(&ids), fallback))
            },
        )
        .await
        .map_err(|e| {
            FixtraceError::Match(MatchError::InitFailed(format!("spawn_blocking failed: {e}")))
        })??;

        stats.record("mining.commits", mining.commits.len() as f64);
        stats.record("mining.skipped", mining.skipped as f64);
        stats.record("mining.full_history_fallback", f64::from(u8::from(fallback)));

        // 후보 전처리 및 규칙 엔진 실행 (실행마다 새 엔진 = 실행 전용 상태)
        let mut candidates: Vec<Candidate> =
            mining.commits.into_iter().map(Candidate::new).collect();
        let mut engine = RuleEngine::new(&self.config);
        engine.run(&mut candidates, &advisory, &mut stats);

        rank::rank(&mut candidates);

        let elapsed = started.elapsed();
        stats.append_duration("run.duration_ms", elapsed);

        let report = MatchReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            advisory_id: advisory.vuln_id.clone(),
            repository_url: repo_url.to_owned(),
            candidates: candidates.iter().map(RankedCandidate::from).collect(),
            commits_skipped: mining.skipped,
            full_history_fallback: fallback,
            stats: stats.to_json_tree(),
            completed_at: SystemTime::now(),
        };

        counter!(m::MATCH_ENGINE_RUNS_COMPLETED_TOTAL).increment(1);
        gauge!(m::MATCH_ENGINE_CANDIDATES_RANKED).set(report.candidates.len() as f64);
        histogram!(m::MATCH_ENGINE_RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());
        self.runs_completed.fetch_add(1, Ordering::Relaxed);

        // 다운스트림으로 이벤트 전송 — 채널이 가득 차도 실행 결과는 유효하다
        let event = MatchEvent::new(report.clone());
        if let Err(e) = self.report_tx.try_send(event) {
            warn!(
                advisory = %report.advisory_id,
                error = %e,
                "failed to send match event (channel full or closed)"
            );
        }

        info!(
            advisory = %report.advisory_id,
            candidates = report.candidates.len(),
            relevant = report.relevant_count(),
            skipped = report.commits_skipped,
            elapsed_ms = elapsed.as_millis() as u64,
            "matching run completed"
        );

        Ok(report)
    }
}

impl Pipeline for FixMatcher {
    async fn start(&mut self) -> Result<(), FixtraceError> {
        if self.state == MatcherState::Running {
            return Err(fixtrace_core::error::PipelineError::AlreadyRunning.into());
        }

        info!("starting match engine");
        self.state = MatcherState::Running;
        info!("match engine started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), FixtraceError> {
        if self.state != MatcherState::Running {
            return Err(fixtrace_core::error::PipelineError::NotRunning.into());
        }

        info!("stopping match engine");
        self.state = MatcherState::Stopped;
        info!("match engine stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            MatcherState::Running => {
                if self.report_tx.is_closed() {
                    HealthStatus::Degraded("report channel closed".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            MatcherState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            MatcherState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// [`FixMatcher`] 빌더
///
/// 매처를 구성하고 필요한 채널을 생성합니다.
pub struct FixMatcherBuilder {
    config: MatchEngineConfig,
    repo_config: RepoMinerConfig,
    report_tx: Option<mpsc::Sender<MatchEvent>>,
}

impl FixMatcherBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: MatchEngineConfig::default(),
            repo_config: RepoMinerConfig::default(),
            report_tx: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: MatchEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 저장소 마이너 설정을 지정합니다.
    pub fn repo_config(mut self, config: RepoMinerConfig) -> Self {
        self.repo_config = config;
        self
    }

    /// 외부 결과 이벤트 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn report_sender(mut self, tx: mpsc::Sender<MatchEvent>) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// 매처를 빌드합니다.
    ///
    /// # Returns
    ///
    /// - `FixMatcher`: 매처 인스턴스
    /// - `Option<mpsc::Receiver<MatchEvent>>`: 결과 수신 채널
    ///   (외부 report_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(FixMatcher, Option<mpsc::Receiver<MatchEvent>>), MatchEngineError> {
        self.config.validate()?;
        self.repo_config
            .validate()
            .map_err(|e| MatchEngineError::Config {
                field: "repo_config".to_owned(),
                reason: e.to_string(),
            })?;

        let (report_tx, report_rx) = if let Some(tx) = self.report_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.report_channel_capacity);
            (tx, Some(rx))
        };

        let matcher = FixMatcher {
            config: self.config,
            repo_config: self.repo_config,
            state: MatcherState::Initialized,
            report_tx,
            runs_completed: Arc::new(AtomicU64::new(0)),
        };

        Ok((matcher, report_rx))
    }
}

impl Default for FixMatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_creates_matcher() {
        let (matcher, report_rx) = FixMatcherBuilder::new().build().unwrap();
        assert_eq!(matcher.state_name(), "initialized");
        assert!(report_rx.is_some());
        assert_eq!(matcher.runs_completed(), 0);
    }

    #[test]
    fn builder_with_external_report_sender() {
        let (tx, _rx) = mpsc::channel(8);
        let (_matcher, report_rx) = FixMatcherBuilder::new().report_sender(tx).build().unwrap();
        assert!(report_rx.is_none());
    }

    #[test]
    fn builder_rejects_invalid_engine_config() {
        let result = FixMatcherBuilder::new()
            .config(MatchEngineConfig {
                twin_similarity: 0.1,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_invalid_repo_config() {
        let result = FixMatcherBuilder::new()
            .repo_config(RepoMinerConfig {
                git_timeout_secs: 0,
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn matcher_health_check_before_start() {
        let (matcher, _rx) = FixMatcherBuilder::new().build().unwrap();
        assert!(matcher.health_check().await.is_unhealthy());
    }

    #[tokio::test]
    async fn matcher_start_stop_lifecycle() {
        let (mut matcher, _rx) = FixMatcherBuilder::new().build().unwrap();

        matcher.start().await.unwrap();
        assert_eq!(matcher.state_name(), "running");
        assert!(matcher.health_check().await.is_healthy());

        // Double start fails
        assert!(matcher.start().await.is_err());

        matcher.stop().await.unwrap();
        assert_eq!(matcher.state_name(), "stopped");

        // Double stop fails
        assert!(matcher.stop().await.is_err());
    }

    #[tokio::test]
    async fn matcher_degraded_when_report_channel_closed() {
        let (mut matcher, report_rx) = FixMatcherBuilder::new().build().unwrap();
        matcher.start().await.unwrap();

        drop(report_rx);
        let status = matcher.health_check().await;
        assert!(!status.is_healthy());
        assert!(!status.is_unhealthy());
    }

    #[tokio::test]
    async fn match_advisory_unavailable_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (matcher, _rx) = FixMatcherBuilder::new()
            .repo_config(RepoMinerConfig {
                clone_dir: dir.path().display().to_string(),
                ..Default::default()
            })
            .build()
            .unwrap();

        let advisory = AdvisoryRecord::new("CVE-2024-0001", "desc");
        let err = matcher
            .match_advisory(advisory, "/nonexistent/fixtrace/repo")
            .await
            .unwrap_err();
        assert!(matches!(err, FixtraceError::Repo(_)));
    }
}
