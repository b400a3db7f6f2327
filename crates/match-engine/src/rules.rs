//! 스코어링 규칙 — 단일 인터페이스로 디스패치되는 태그드 변형 모델
//!
//! 규칙은 데이터(고정 ID와 가중치)와 술어(predicate)의 쌍입니다.
//! 술어는 {구조 규칙, 텍스트 규칙, 교차 참조 규칙, 쌍둥이 규칙}을
//! 하나의 enum 변형으로 표현하고 [`Rule::apply`] 하나로 디스패치합니다.
//!
//! 규칙은 `(후보, 어드바이저리, 단계 공유 상태)`만의 순수 함수이며
//! 서로를 관찰하지 않습니다. 단계 내 규칙 순서는 관련도에 영향을 주지
//! 않습니다 — 구성원과 가중치만 의미가 있습니다.

use std::collections::HashMap;

use fixtrace_core::types::AdvisoryRecord;

use crate::candidate::Candidate;
use crate::config::MatchEngineConfig;
use crate::error::MatchEngineError;

/// 메시지에서 찾는 보안 관련 키워드 (소문자 부분 일치)
const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "vulnerab",
    "exploit",
    "overflow",
    "injection",
    "xss",
    "xxe",
    "csrf",
    "rce",
    "denial of service",
    "deserializ",
    "sanitiz",
    "traversal",
    "bypass",
    "unauthoriz",
];

/// 교차 참조에서 커밋을 식별하는 데 요구하는 최소 해시 접두사 길이
const COMMIT_PREFIX_LEN: usize = 10;

/// 단계 공유 상태 — 규칙에 읽기 전용으로 전달됩니다.
///
/// 단계 진입 시점에 만들어지는 스냅샷이므로, 단계 내 후보 처리 순서는
/// 규칙 결과에 영향을 주지 않습니다 (병렬 적용 가능 계약).
pub struct PhaseContext<'a> {
    /// 직전 단계까지 누적된 커밋별 관련도
    pub relevance_by_commit: &'a HashMap<String, u32>,
}

/// 규칙 술어 — 모든 규칙 종류를 하나의 태그드 변형으로 표현합니다.
#[derive(Debug, Clone)]
pub enum RulePredicate {
    // --- 구조 규칙 ---
    /// 변경 파일이 어드바이저리의 관련 경로와 일치
    ChangesRelevantPath,
    /// 어드바이저리 코드 토큰이 변경 파일 경로에 등장
    AdvisoryTokenInFilePath,

    // --- 교차 참조 규칙 ---
    /// 어드바이저리 참조 URL이 이 커밋 해시를 언급
    CommitIdInReferences,
    /// 커밋 메시지의 이슈 참조가 어드바이저리 참조 URL에 등장
    IssueRefInReferences,

    // --- 텍스트 규칙 ---
    /// 커밋 메시지가 어드바이저리의 취약점 ID를 정확히 언급
    VulnIdInMessage,
    /// 어드바이저리 코드 토큰이 커밋 메시지에 등장
    AdvisoryTokenInMessage,
    /// 어드바이저리 코드 토큰이 diff의 변경 줄에 등장
    AdvisoryTokenInDiff,
    /// 보안 관련 키워드가 커밋 메시지에 등장
    SecurityKeywordInMessage,

    // --- 쌍둥이 규칙 ---
    /// 쌍둥이가 하나 이상 존재
    HasTwins,
    /// 이미 강하게 매칭된 후보의 쌍둥이
    TwinOfStrongMatch {
        /// "강한 매칭"으로 간주하는 관련도 하한
        min_relevance: u32,
    },

    /// 항상 실패하는 술어 (엔진의 실패 격리 테스트 전용)
    #[cfg(test)]
    FailsForTesting,
}

/// 스코어링 규칙 — 불변 ID, 고정 가중치, 술어
#[derive(Debug, Clone)]
pub struct Rule {
    /// 규칙 ID (주석에 기록됨)
    pub id: &'static str,
    /// 고정 관련도 가중치
    pub weight: u32,
    /// 매칭 술어
    pub predicate: RulePredicate,
}

impl Rule {
    /// 후보 하나에 규칙을 적용합니다.
    ///
    /// 매칭되면 사람이 읽을 수 있는 설명을 `Some`으로 반환합니다.
    /// 실패(`Err`)는 엔진이 단계 경계에서 포착하여 "매칭 안 됨"으로
    /// 처리합니다.
    pub fn apply(
        &self,
        candidate: &Candidate,
        advisory: &AdvisoryRecord,
        ctx: &PhaseContext<'_>,
    ) -> Result<Option<String>, MatchEngineError> {
        let matched = match &self.predicate {
            RulePredicate::ChangesRelevantPath => changes_relevant_path(candidate, advisory),
            RulePredicate::AdvisoryTokenInFilePath => token_in_file_path(candidate, advisory),
            RulePredicate::CommitIdInReferences => commit_id_in_references(candidate, advisory),
            RulePredicate::IssueRefInReferences => issue_ref_in_references(candidate, advisory),
            RulePredicate::VulnIdInMessage => vuln_id_in_message(candidate, advisory),
            RulePredicate::AdvisoryTokenInMessage => token_in_message(candidate, advisory),
            RulePredicate::AdvisoryTokenInDiff => token_in_diff(candidate, advisory),
            RulePredicate::SecurityKeywordInMessage => security_keyword_in_message(candidate),
            RulePredicate::HasTwins => has_twins(candidate),
            RulePredicate::TwinOfStrongMatch { min_relevance } => {
                twin_of_strong_match(candidate, ctx, *min_relevance)
            }
            #[cfg(test)]
            RulePredicate::FailsForTesting => {
                return Err(MatchEngineError::Rule {
                    rule_id: self.id.to_owned(),
                    commit_id: candidate.commit_id().to_owned(),
                    reason: "injected failure".to_owned(),
                });
            }
        };
        Ok(matched)
    }
}

/// 하나의 단계 진입 시 수행되는 준비 작업
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSetup {
    /// 준비 작업 없음
    None,
    /// 쌍둥이 유사도 인덱스를 구축하고 후보에 쌍둥이 링크를 기록
    TwinIndex,
}

/// 이름 있는 규칙 그룹 — 선언된 순서대로 실행됩니다.
#[derive(Debug, Clone)]
pub struct Phase {
    /// 단계명 (통계/메트릭 경로에 사용)
    pub name: &'static str,
    /// 단계 진입 시 준비 작업
    pub setup: PhaseSetup,
    /// 규칙 집합
    pub rules: Vec<Rule>,
}

/// 기본 단계 구성을 만듭니다.
///
/// 구조/메타데이터 단계 → 텍스트 휴리스틱 단계 → 쌍둥이 단계 순서입니다.
/// 쌍둥이 단계는 앞 단계가 기록한 관련도를 읽으므로 반드시 마지막입니다.
pub fn default_phases(config: &MatchEngineConfig) -> Vec<Phase> {
    vec![
        Phase {
            name: "structural",
            setup: PhaseSetup::None,
            rules: vec![
                Rule {
                    id: "CHANGES_RELEVANT_PATH",
                    weight: 32,
                    predicate: RulePredicate::ChangesRelevantPath,
                },
                Rule {
                    id: "ADV_KEYWORDS_IN_FILES",
                    weight: 16,
                    predicate: RulePredicate::AdvisoryTokenInFilePath,
                },
                Rule {
                    id: "COMMIT_IN_ADVISORY_REFS",
                    weight: 64,
                    predicate: RulePredicate::CommitIdInReferences,
                },
                Rule {
                    id: "XREF_ISSUE_IN_REFS",
                    weight: 32,
                    predicate: RulePredicate::IssueRefInReferences,
                },
            ],
        },
        Phase {
            name: "textual",
            setup: PhaseSetup::None,
            rules: vec![
                Rule {
                    id: "REF_ADV_VULN_ID",
                    weight: 64,
                    predicate: RulePredicate::VulnIdInMessage,
                },
                Rule {
                    id: "ADV_KEYWORDS_IN_MSG",
                    weight: 16,
                    predicate: RulePredicate::AdvisoryTokenInMessage,
                },
                Rule {
                    id: "ADV_KEYWORDS_IN_DIFF",
                    weight: 16,
                    predicate: RulePredicate::AdvisoryTokenInDiff,
                },
                Rule {
                    id: "SEC_KEYWORDS_IN_MSG",
                    weight: 8,
                    predicate: RulePredicate::SecurityKeywordInMessage,
                },
            ],
        },
        Phase {
            name: "twins",
            setup: PhaseSetup::TwinIndex,
            rules: vec![
                Rule {
                    id: "COMMIT_HAS_TWINS",
                    weight: 4,
                    predicate: RulePredicate::HasTwins,
                },
                Rule {
                    id: "TWIN_OF_STRONG_MATCH",
                    weight: 32,
                    predicate: RulePredicate::TwinOfStrongMatch {
                        min_relevance: config.strong_match_relevance,
                    },
                },
            ],
        },
    ]
}

// --- 술어 구현 ---

fn changes_relevant_path(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    for file in &candidate.commit.changed_files {
        for path in &advisory.relevant_paths {
            if file == path || file.ends_with(path) || path.ends_with(file) {
                return Some(format!("changes advisory-relevant path '{file}'"));
            }
        }
    }
    None
}

fn token_in_file_path(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    for file in &candidate.commit.changed_files {
        let file_lower = file.to_lowercase();
        for token in &advisory.code_tokens {
            if file_lower.contains(&token.to_lowercase()) {
                return Some(format!("changed file '{file}' mentions token '{token}'"));
            }
        }
    }
    None
}

fn commit_id_in_references(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    let commit_id = candidate.commit_id();
    if commit_id.len() < COMMIT_PREFIX_LEN {
        return None;
    }
    let prefix = &commit_id[..COMMIT_PREFIX_LEN];
    advisory
        .references
        .iter()
        .find(|reference| reference.contains(prefix))
        .map(|reference| format!("advisory reference '{reference}' mentions this commit"))
}

fn issue_ref_in_references(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    for issue in &candidate.issue_refs {
        for reference in &advisory.references {
            if reference_mentions_issue(reference, issue) {
                return Some(format!(
                    "issue '{issue}' from the commit message appears in advisory reference '{reference}'"
                ));
            }
        }
    }
    None
}

/// 참조 URL이 이슈 참조를 언급하는지 판정합니다.
///
/// `PROJ-123` 형태 키는 부분 문자열로, 숫자 참조는 경로 세그먼트 경계로
/// 확인하여 `/123`이 `/1234`에 매칭되는 것을 막습니다.
fn reference_mentions_issue(reference: &str, issue: &str) -> bool {
    if issue.chars().all(|c| c.is_ascii_digit()) {
        let needle = format!("/{issue}");
        for (pos, _) in reference.match_indices(&needle) {
            let after = reference[pos + needle.len()..].chars().next();
            if !after.is_some_and(|c| c.is_ascii_digit()) {
                return true;
            }
        }
        false
    } else {
        reference.contains(issue)
    }
}

fn vuln_id_in_message(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    // CVE 형태 ID는 파싱된 목록과 정확히 비교한다 — 같은 메시지에 등장하는
    // 다른 CVE ID에는 매칭되지 않아야 한다
    if candidate
        .mentioned_cves
        .iter()
        .any(|id| id == &advisory.vuln_id)
    {
        return Some(format!(
            "commit message mentions the advisory id {}",
            advisory.vuln_id
        ));
    }
    // CVE 형태가 아닌 자유 형식 ID는 부분 문자열로 확인
    if !advisory.vuln_id.starts_with("CVE-") && candidate.commit.message.contains(&advisory.vuln_id)
    {
        return Some(format!(
            "commit message mentions the advisory id {}",
            advisory.vuln_id
        ));
    }
    None
}

fn token_in_message(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    let message_lower = candidate.commit.message.to_lowercase();
    let matched: Vec<&str> = advisory
        .code_tokens
        .iter()
        .filter(|token| message_lower.contains(&token.to_lowercase()))
        .map(String::as_str)
        .take(3)
        .collect();
    if matched.is_empty() {
        None
    } else {
        Some(format!(
            "commit message mentions advisory tokens: {}",
            matched.join(", ")
        ))
    }
}

fn token_in_diff(candidate: &Candidate, advisory: &AdvisoryRecord) -> Option<String> {
    // 변경된 줄만 본다 (파일 헤더 +++/---는 제외)
    let changed_lines = candidate
        .commit
        .diff
        .lines()
        .filter(|l| {
            (l.starts_with('+') && !l.starts_with("+++"))
                || (l.starts_with('-') && !l.starts_with("---"))
        })
        .map(str::to_lowercase)
        .collect::<Vec<_>>();

    for token in &advisory.code_tokens {
        let token_lower = token.to_lowercase();
        if changed_lines.iter().any(|l| l.contains(&token_lower)) {
            return Some(format!("diff touches advisory token '{token}'"));
        }
    }
    None
}

fn security_keyword_in_message(candidate: &Candidate) -> Option<String> {
    let message_lower = candidate.commit.message.to_lowercase();
    SECURITY_KEYWORDS
        .iter()
        .find(|keyword| message_lower.contains(*keyword))
        .map(|keyword| format!("commit message contains security keyword '{keyword}'"))
}

fn has_twins(candidate: &Candidate) -> Option<String> {
    if candidate.twins.is_empty() {
        None
    } else {
        Some(format!(
            "commit has {} twin(s): {}",
            candidate.twins.len(),
            candidate.twins.join(", ")
        ))
    }
}

fn twin_of_strong_match(
    candidate: &Candidate,
    ctx: &PhaseContext<'_>,
    min_relevance: u32,
) -> Option<String> {
    candidate
        .twins
        .iter()
        .find(|twin| {
            ctx.relevance_by_commit
                .get(twin.as_str())
                .is_some_and(|relevance| *relevance >= min_relevance)
        })
        .map(|twin| format!("twin commit {twin} already matched strongly"))
}
