//! 매칭 결과 이벤트
//!
//! [`MatchEvent`]는 매칭 실행 완료를 나타내는 이벤트입니다.
//! core의 [`Event`] trait을 구현하여 `tokio::mpsc` 채널을 통한 전송이
//! 가능합니다. 리포트/스토리지 협력자가 다운스트림에서 수신합니다.

use std::fmt;

use fixtrace_core::event::{EVENT_TYPE_MATCH, Event, EventMetadata, MODULE_MATCH_ENGINE};

use crate::report::MatchReport;

/// 매칭 실행 완료 이벤트
#[derive(Debug, Clone)]
pub struct MatchEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 매칭 결과
    pub report: MatchReport,
}

impl MatchEvent {
    /// 새로운 trace를 시작하는 매칭 이벤트를 생성합니다.
    pub fn new(report: MatchReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_MATCH_ENGINE),
            report,
        }
    }

    /// 기존 trace에 연결된 매칭 이벤트를 생성합니다.
    pub fn with_trace(report: MatchReport, trace_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::new(MODULE_MATCH_ENGINE, trace_id),
            report,
        }
    }
}

impl Event for MatchEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_MATCH
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MatchEvent[{}] advisory={} candidates={}",
            &self.id[..8.min(self.id.len())],
            self.report.advisory_id,
            self.report.candidates.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn sample_report() -> MatchReport {
        MatchReport {
            run_id: "run-1".to_owned(),
            advisory_id: "CVE-2024-0001".to_owned(),
            repository_url: "https://github.com/example/project".to_owned(),
            candidates: vec![],
            commits_skipped: 0,
            full_history_fallback: false,
            stats: serde_json::json!({}),
            completed_at: SystemTime::now(),
        }
    }

    #[test]
    fn match_event_implements_event_trait() {
        let event = MatchEvent::new(sample_report());
        assert_eq!(event.event_type(), "match");
        assert!(!event.event_id().is_empty());
        assert_eq!(event.metadata().source_module, "match-engine");
    }

    #[test]
    fn match_event_with_trace_preserves_trace_id() {
        let event = MatchEvent::with_trace(sample_report(), "my-trace");
        assert_eq!(event.metadata().trace_id, "my-trace");
    }

    #[test]
    fn match_event_display() {
        let event = MatchEvent::new(sample_report());
        let display = event.to_string();
        assert!(display.contains("MatchEvent"));
        assert!(display.contains("CVE-2024-0001"));
    }

    #[test]
    fn match_event_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MatchEvent>();
    }
}
