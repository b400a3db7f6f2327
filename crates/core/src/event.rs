//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 매칭 결과는 이벤트 기반 메시지 패싱으로 다운스트림(리포트/스토리지
//! 협력자)에 전달됩니다. [`EventMetadata`]는 모든 이벤트에 공통으로
//! 포함되는 메타데이터이며, [`Event`] trait은 모든 이벤트 타입이
//! 구현해야 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// --- 모듈명 상수 ---

/// 저장소 마이너 모듈명
pub const MODULE_REPO_MINER: &str = "repo-miner";
/// 매칭 엔진 모듈명
pub const MODULE_MATCH_ENGINE: &str = "match-engine";

// --- 이벤트 타입 상수 ---

/// 매칭 결과 이벤트 타입
pub const EVENT_TYPE_MATCH: &str = "match";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "match-engine")
    pub source_module: String,
    /// 분산 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source={} trace={}", self.source_module, self.trace_id)
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_with_new_trace_generates_uuid() {
        let meta = EventMetadata::with_new_trace(MODULE_MATCH_ENGINE);
        assert_eq!(meta.source_module, "match-engine");
        assert!(!meta.trace_id.is_empty());

        let other = EventMetadata::with_new_trace(MODULE_MATCH_ENGINE);
        assert_ne!(meta.trace_id, other.trace_id);
    }

    #[test]
    fn metadata_preserves_given_trace_id() {
        let meta = EventMetadata::new(MODULE_REPO_MINER, "trace-123");
        assert_eq!(meta.trace_id, "trace-123");
        assert_eq!(meta.source_module, "repo-miner");
    }

    #[test]
    fn metadata_display() {
        let meta = EventMetadata::new(MODULE_MATCH_ENGINE, "abc");
        let display = meta.to_string();
        assert!(display.contains("match-engine"));
        assert!(display.contains("abc"));
    }

    #[test]
    fn metadata_serialize_roundtrip() {
        let meta = EventMetadata::new(MODULE_MATCH_ENGINE, "trace-1");
        let json = serde_json::to_string(&meta).unwrap();
        let parsed: EventMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.trace_id, meta.trace_id);
    }
}
