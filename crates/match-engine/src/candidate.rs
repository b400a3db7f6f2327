//! 매칭 후보 — 전처리된 커밋과 스코어링 상태
//!
//! [`Candidate`]는 [`RawCommit`] 하나를 감싸고 두 종류의 파생 필드를
//! 추가합니다:
//!
//! - **어드바이저리 무관 필드** (생성 시 한 번 계산): 메시지에서 파싱한
//!   이슈 트래커 참조, 메시지에 포함된 CVE ID
//! - **어드바이저리 의존 필드** (스코어링 중 기록): 쌍둥이 커밋 ID,
//!   규칙 주석(annotation), 관련도 누적값
//!
//! 불변식: 관련도는 항상 주석 가중치의 합과 같습니다. 주석은 규칙 ID당
//! 한 번만 기록되며 (write-once), 다른 규칙의 주석을 덮어쓸 수 없습니다.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use fixtrace_core::types::RawCommit;

use crate::twins::MinHashSignature;

/// CVE ID 패턴
static CVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CVE-\d{4}-\d{4,}").expect("cve id regex is valid"));

/// 이슈 트래커 참조 패턴 (#123, GH-123, PROJ-123)
static ISSUE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:#|GH-)(\d+)|\b([A-Z][A-Z0-9]+-\d+)\b").expect("issue ref regex is valid")
});

/// 규칙이 남긴 주석 — (규칙 ID, 가중치, 설명)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// 매칭된 규칙 ID
    pub rule_id: String,
    /// 규칙 가중치
    pub weight: u32,
    /// 사람이 읽을 수 있는 매칭 사유
    pub explanation: String,
}

/// 스코어링 대상 후보 커밋
#[derive(Debug, Clone)]
pub struct Candidate {
    /// 원시 커밋
    pub commit: RawCommit,
    /// 메시지에서 파싱한 이슈 트래커 참조 번호 (숫자 부분만)
    pub issue_refs: Vec<String>,
    /// 메시지에 포함된 CVE ID
    pub mentioned_cves: Vec<String>,
    /// 근사 유사도 시그니처 (쌍둥이 단계 준비 작업에서 계산)
    pub signature: Option<MinHashSignature>,
    /// 쌍둥이로 판정된 다른 후보의 커밋 ID
    pub twins: Vec<String>,
    /// 규칙 주석 (append 순서 유지)
    annotations: Vec<Annotation>,
    /// 관련도 누적값
    relevance: u32,
}

impl Candidate {
    /// 원시 커밋을 전처리하여 후보를 생성합니다.
    pub fn new(commit: RawCommit) -> Self {
        let issue_refs = extract_issue_refs(&commit.message);
        let mentioned_cves = extract_cve_ids(&commit.message);
        Self {
            commit,
            issue_refs,
            mentioned_cves,
            signature: None,
            twins: Vec::new(),
            annotations: Vec::new(),
            relevance: 0,
        }
    }

    /// 규칙 주석을 기록하고 관련도를 누적합니다.
    ///
    /// 같은 규칙 ID로 이미 주석이 있으면 기록하지 않고 `false`를
    /// 반환합니다 (write-once 계약).
    pub fn annotate(
        &mut self,
        rule_id: &str,
        weight: u32,
        explanation: impl Into<String>,
    ) -> bool {
        if self.has_annotation(rule_id) {
            return false;
        }
        self.annotations.push(Annotation {
            rule_id: rule_id.to_owned(),
            weight,
            explanation: explanation.into(),
        });
        self.relevance += weight;
        true
    }

    /// 해당 규칙의 주석이 이미 있는지 반환합니다.
    pub fn has_annotation(&self, rule_id: &str) -> bool {
        self.annotations.iter().any(|a| a.rule_id == rule_id)
    }

    /// 현재 관련도를 반환합니다.
    pub fn relevance(&self) -> u32 {
        self.relevance
    }

    /// 기록된 주석 목록을 반환합니다.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// 커밋 해시를 반환합니다.
    pub fn commit_id(&self) -> &str {
        &self.commit.commit_id
    }
}

/// 메시지에서 이슈 트래커 참조를 추출합니다.
///
/// `#123`/`GH-123`은 숫자로, `PROJ-123` 형태는 그대로 정규화합니다.
/// CVE ID는 이슈 참조가 아니므로 제외합니다.
fn extract_issue_refs(message: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut refs = Vec::new();

    for caps in ISSUE_REF.captures_iter(message) {
        let normalized = if let Some(number) = caps.get(1) {
            number.as_str().to_owned()
        } else if let Some(key) = caps.get(2) {
            if key.as_str().starts_with("CVE-") {
                continue;
            }
            key.as_str().to_owned()
        } else {
            continue;
        };

        if seen.insert(normalized.clone()) {
            refs.push(normalized);
        }
    }

    refs
}

/// 메시지에 포함된 CVE ID를 추출합니다.
fn extract_cve_ids(message: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for m in CVE_ID.find_iter(message) {
        let id = m.as_str().to_owned();
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    ids
}
