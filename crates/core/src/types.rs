//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 어드바이저리와 저장소 커밋을 나타내는 데이터 구조를 정의합니다.
//! `fixtrace-repo-miner`가 [`RawCommit`]을 생산하고,
//! `fixtrace-match-engine`이 [`AdvisoryRecord`]와 대조하여 순위를 매깁니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 영향 버전 구간
///
/// 어드바이저리의 자유 형식 버전 구간 `"A:B"`를 나타냅니다.
/// `A`는 마지막으로 취약했던 버전, `B`는 수정된 버전이며 둘 다 생략 가능합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInterval {
    /// 마지막 취약 버전 (하한, 없으면 저장소 루트부터)
    pub vulnerable: Option<String>,
    /// 수정 버전 (상한-배타, 없으면 최신 태그까지)
    pub fixed: Option<String>,
}

impl VersionInterval {
    /// `"A:B"` 형식의 문자열에서 구간을 파싱합니다.
    ///
    /// 빈 쪽은 `None`이 됩니다. 구분자가 없으면 전체를 수정 버전으로 해석합니다.
    pub fn parse(s: &str) -> Self {
        let (vulnerable, fixed) = match s.split_once(':') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => ("", s.trim()),
        };
        Self {
            vulnerable: (!vulnerable.is_empty()).then(|| vulnerable.to_owned()),
            fixed: (!fixed.is_empty()).then(|| fixed.to_owned()),
        }
    }

    /// 양쪽 경계가 모두 비어 있는지 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.vulnerable.is_none() && self.fixed.is_none()
    }
}

impl fmt::Display for VersionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.vulnerable.as_deref().unwrap_or(""),
            self.fixed.as_deref().unwrap_or(""),
        )
    }
}

/// 취약점 어드바이저리 레코드
///
/// 외부 어드바이저리 소스(NVD/MITRE 클라이언트)가 채워서 전달하는 입력 값입니다.
/// 코어는 intake 단계의 필드 보강(코드 토큰, 관련 경로 추출) 이후
/// 이 레코드를 변경하지 않으며, 모든 규칙은 읽기 전용으로 참조합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    /// 취약점 ID (예: CVE-2020-26258) — 확정 후 불변
    pub vuln_id: String,
    /// 취약점 설명
    pub description: String,
    /// 공개 시각
    pub published: Option<SystemTime>,
    /// 최종 수정 시각
    pub modified: Option<SystemTime>,
    /// 영향 버전 구간
    pub interval: VersionInterval,
    /// 참조 URL 목록
    pub references: Vec<String>,
    /// 설명에서 추출한 코드 토큰 (식별자 형태 단어)
    pub code_tokens: Vec<String>,
    /// 설명/참조에서 추출한 관련 파일 경로
    pub relevant_paths: Vec<String>,
}

impl AdvisoryRecord {
    /// 최소 필드로 레코드를 생성합니다.
    ///
    /// 코드 토큰과 관련 경로는 matching 엔진의 intake 단계에서 채워집니다.
    pub fn new(vuln_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            vuln_id: vuln_id.into(),
            description: description.into(),
            published: None,
            modified: None,
            interval: VersionInterval::default(),
            references: Vec::new(),
            code_tokens: Vec::new(),
            relevant_paths: Vec::new(),
        }
    }

    /// 버전 구간을 설정합니다.
    pub fn with_interval(mut self, interval: VersionInterval) -> Self {
        self.interval = interval;
        self
    }

    /// 참조 URL 목록을 설정합니다.
    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }
}

impl fmt::Display for AdvisoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] refs={}",
            self.vuln_id,
            self.interval,
            self.references.len(),
        )
    }
}

/// 통합 diff 내 변경 구간
///
/// diff의 `@@` 헌크 헤더에서 추출한 (시작 줄, 길이) 쌍입니다.
/// 줄 번호는 변경 후 파일(post-image) 기준입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// 시작 줄 번호 (1-기반)
    pub start_line: u32,
    /// 구간 길이 (줄 수)
    pub length: u32,
}

/// 저장소에서 추출한 원시 커밋
///
/// `(repository_url, commit_id)` 쌍이 전역 식별자입니다.
/// 추출 후 불변이며, 코어는 저장소 작업 복사본을 절대 변경하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    /// 저장소 URL
    pub repository_url: String,
    /// 커밋 해시
    pub commit_id: String,
    /// author 타임스탬프 (unix 초)
    pub timestamp: i64,
    /// 커밋 메시지 전문
    pub message: String,
    /// 변경 구간 목록 (diff 순서 유지)
    pub hunks: Vec<Hunk>,
    /// 변경된 파일 경로 목록
    pub changed_files: Vec<String>,
    /// 통합 diff 텍스트
    pub diff: String,
    /// 이 커밋을 포함하는(reachable) 태그 목록
    pub tags: Vec<String>,
}

impl RawCommit {
    /// 커밋 메시지의 첫 줄을 반환합니다.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// 단축 커밋 해시(8자)를 반환합니다.
    pub fn short_id(&self) -> &str {
        &self.commit_id[..8.min(self.commit_id.len())]
    }
}

impl fmt::Display for RawCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files={} hunks={}: {}",
            self.short_id(),
            self.changed_files.len(),
            self.hunks.len(),
            self.summary(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit() -> RawCommit {
        RawCommit {
            repository_url: "https://github.com/example/project".to_owned(),
            commit_id: "0123456789abcdef0123456789abcdef01234567".to_owned(),
            timestamp: 1_600_000_000,
            message: "Fix deserialization gadget\n\nDetails follow.".to_owned(),
            hunks: vec![Hunk {
                start_line: 10,
                length: 5,
            }],
            changed_files: vec!["src/io/xml.rs".to_owned()],
            diff: String::new(),
            tags: vec!["v1.4.16".to_owned()],
        }
    }

    #[test]
    fn interval_parse_both_bounds() {
        let interval = VersionInterval::parse("1.3:1.3.1");
        assert_eq!(interval.vulnerable.as_deref(), Some("1.3"));
        assert_eq!(interval.fixed.as_deref(), Some("1.3.1"));
    }

    #[test]
    fn interval_parse_empty_lower_bound() {
        let interval = VersionInterval::parse(":2.7");
        assert_eq!(interval.vulnerable, None);
        assert_eq!(interval.fixed.as_deref(), Some("2.7"));
    }

    #[test]
    fn interval_parse_empty_upper_bound() {
        let interval = VersionInterval::parse("1.9:");
        assert_eq!(interval.vulnerable.as_deref(), Some("1.9"));
        assert_eq!(interval.fixed, None);
    }

    #[test]
    fn interval_parse_without_separator_is_fixed_version() {
        let interval = VersionInterval::parse("2.7");
        assert_eq!(interval.vulnerable, None);
        assert_eq!(interval.fixed.as_deref(), Some("2.7"));
    }

    #[test]
    fn interval_parse_empty_string() {
        let interval = VersionInterval::parse("");
        assert!(interval.is_empty());
    }

    #[test]
    fn interval_display_roundtrip() {
        let interval = VersionInterval::parse("1.3:1.3.1");
        assert_eq!(interval.to_string(), "1.3:1.3.1");
        assert_eq!(VersionInterval::parse(":2.7").to_string(), ":2.7");
    }

    #[test]
    fn advisory_builder_fields() {
        let advisory = AdvisoryRecord::new("CVE-2020-26258", "XXE in XStream")
            .with_interval(VersionInterval::parse(":1.4.15"))
            .with_references(vec!["https://github.com/x-stream/xstream/issues/1".to_owned()]);
        assert_eq!(advisory.vuln_id, "CVE-2020-26258");
        assert_eq!(advisory.interval.fixed.as_deref(), Some("1.4.15"));
        assert_eq!(advisory.references.len(), 1);
        assert!(advisory.code_tokens.is_empty());
    }

    #[test]
    fn advisory_display() {
        let advisory = AdvisoryRecord::new("CVE-2024-0001", "desc")
            .with_interval(VersionInterval::parse("1.0:1.1"));
        let display = advisory.to_string();
        assert!(display.contains("CVE-2024-0001"));
        assert!(display.contains("1.0:1.1"));
    }

    #[test]
    fn commit_summary_is_first_line() {
        let commit = sample_commit();
        assert_eq!(commit.summary(), "Fix deserialization gadget");
    }

    #[test]
    fn commit_short_id() {
        let commit = sample_commit();
        assert_eq!(commit.short_id(), "01234567");
    }

    #[test]
    fn commit_short_id_handles_short_hash() {
        let mut commit = sample_commit();
        commit.commit_id = "abc".to_owned();
        assert_eq!(commit.short_id(), "abc");
    }

    #[test]
    fn commit_display() {
        let display = sample_commit().to_string();
        assert!(display.contains("01234567"));
        assert!(display.contains("files=1"));
        assert!(display.contains("Fix deserialization gadget"));
    }

    #[test]
    fn advisory_serialize_roundtrip() {
        let advisory = AdvisoryRecord::new("CVE-2024-0001", "desc")
            .with_interval(VersionInterval::parse("1.0:1.1"));
        let json = serde_json::to_string(&advisory).unwrap();
        let parsed: AdvisoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vuln_id, advisory.vuln_id);
        assert_eq!(parsed.interval, advisory.interval);
    }

    #[test]
    fn commit_serialize_roundtrip() {
        let commit = sample_commit();
        let json = serde_json::to_string(&commit).unwrap();
        let parsed: RawCommit = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.commit_id, commit.commit_id);
        assert_eq!(parsed.hunks, commit.hunks);
    }
}
