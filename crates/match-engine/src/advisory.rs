//! 어드바이저리 intake — 설명/참조에서 매칭 단서 추출
//!
//! 어드바이저리 설명 텍스트에는 종종 코드 식별자(`XStream`,
//! `readObject`, `server.xml`)와 파일 경로가 그대로 등장합니다.
//! [`enrich`]는 레코드를 받아 이 단서들을 `code_tokens`와
//! `relevant_paths` 필드에 정확히 한 번 채워 넣습니다.
//! 이후 레코드는 모든 규칙에서 읽기 전용입니다.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use fixtrace_core::types::AdvisoryRecord;

/// 식별자 형태 토큰 (snake_case, camelCase, dotted.name, call())
static IDENTIFIER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_.]*(?:\(\))?").expect("identifier token regex is valid")
});

/// 소스 파일 경로 형태 토큰
static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[A-Za-z0-9_./-]+\.(?:java|rs|go|py|rb|js|ts|c|cc|cpp|h|hpp|cs|scala|kt|php|xml|yml|yaml|toml|properties)\b",
    )
    .expect("path token regex is valid")
});

/// 어드바이저리 레코드의 파생 필드를 채웁니다.
///
/// 이미 채워져 있으면 아무것도 하지 않습니다 (intake는 한 번만 수행).
pub fn enrich(advisory: &mut AdvisoryRecord) {
    if !advisory.code_tokens.is_empty() || !advisory.relevant_paths.is_empty() {
        return;
    }

    advisory.code_tokens = extract_code_tokens(&advisory.description);
    advisory.relevant_paths = extract_relevant_paths(advisory);

    debug!(
        vuln_id = %advisory.vuln_id,
        code_tokens = advisory.code_tokens.len(),
        relevant_paths = advisory.relevant_paths.len(),
        "advisory enriched"
    );
}

/// 설명에서 코드 식별자 형태의 토큰을 추출합니다.
///
/// 일반 영단어를 거르기 위해 snake_case, camelCase, 점 표기,
/// 호출 괄호 중 하나 이상의 형태를 요구합니다. 등장 순서를 유지하며
/// 중복을 제거합니다.
pub fn extract_code_tokens(description: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();

    for m in IDENTIFIER_TOKEN.find_iter(description) {
        let raw = m.as_str();
        if !looks_like_identifier(raw) {
            continue;
        }
        let token = raw.trim_end_matches("()").trim_matches('.').to_owned();
        if token.len() < 3 {
            continue;
        }
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }

    tokens
}

/// 설명과 참조 URL에서 소스 파일 경로를 추출합니다.
pub fn extract_relevant_paths(advisory: &AdvisoryRecord) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut paths = Vec::new();

    let mut push = |path: String| {
        if seen.insert(path.clone()) {
            paths.push(path);
        }
    };

    for m in PATH_TOKEN.find_iter(&advisory.description) {
        push(m.as_str().trim_start_matches('/').to_owned());
    }

    for reference in &advisory.references {
        for m in PATH_TOKEN.find_iter(reference) {
            // URL에서 호스트명 같은 점 표기는 확장자 목록으로 이미 걸러진다
            push(m.as_str().trim_start_matches('/').to_owned());
        }
    }

    paths
}

/// 토큰이 일반 단어가 아닌 코드 식별자처럼 보이는지 판정합니다.
fn looks_like_identifier(token: &str) -> bool {
    if token.ends_with("()") {
        return true;
    }
    if token.contains('_') {
        return true;
    }
    // 내부 점 표기 (trailing 마침표는 문장 부호)
    if token.trim_matches('.').contains('.') {
        return true;
    }
    // camelCase / PascalCase 혼합 대소문자
    let has_lower = token.chars().any(|c| c.is_ascii_lowercase());
    let has_upper_after_first = token.chars().skip(1).any(|c| c.is_ascii_uppercase());
    has_lower && has_upper_after_first
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtrace_core::types::AdvisoryRecord;

    #[test]
    fn extracts_camel_case_tokens() {
        let tokens = extract_code_tokens(
            "XStream can deserialize arbitrary objects via readObject unless a SecurityFramework is active.",
        );
        assert!(tokens.contains(&"XStream".to_owned()));
        assert!(tokens.contains(&"readObject".to_owned()));
        assert!(tokens.contains(&"SecurityFramework".to_owned()));
        // 일반 영단어는 제외
        assert!(!tokens.contains(&"arbitrary".to_owned()));
        assert!(!tokens.contains(&"objects".to_owned()));
    }

    #[test]
    fn extracts_snake_case_and_calls() {
        let tokens =
            extract_code_tokens("The parse_header() helper mishandles chunk_size values.");
        assert!(tokens.contains(&"parse_header".to_owned()));
        assert!(tokens.contains(&"chunk_size".to_owned()));
    }

    #[test]
    fn extracts_dotted_names() {
        let tokens = extract_code_tokens("Override javax.xml.parsers.DocumentBuilderFactory here.");
        assert!(
            tokens
                .iter()
                .any(|t| t.starts_with("javax.xml.parsers"))
        );
    }

    #[test]
    fn sentence_final_period_is_not_a_dotted_name() {
        let tokens = extract_code_tokens("An attacker can bypass validation.");
        assert!(!tokens.contains(&"validation".to_owned()));
    }

    #[test]
    fn deduplicates_preserving_order() {
        let tokens = extract_code_tokens("readObject calls readObject via readObject");
        assert_eq!(tokens, vec!["readObject".to_owned()]);
    }

    #[test]
    fn extracts_paths_from_description() {
        let mut advisory = AdvisoryRecord::new(
            "CVE-2024-0001",
            "Affected code lives in src/io/xml.rs and webapps/ROOT/config.xml.",
        );
        enrich(&mut advisory);
        assert!(advisory.relevant_paths.contains(&"src/io/xml.rs".to_owned()));
        assert!(
            advisory
                .relevant_paths
                .contains(&"webapps/ROOT/config.xml".to_owned())
        );
    }

    #[test]
    fn extracts_paths_from_references() {
        let mut advisory = AdvisoryRecord::new("CVE-2024-0002", "No paths here.")
            .with_references(vec![
                "https://github.com/example/project/blob/main/src/parser.rs".to_owned(),
            ]);
        enrich(&mut advisory);
        assert!(
            advisory
                .relevant_paths
                .iter()
                .any(|p| p.ends_with("src/parser.rs"))
        );
    }

    #[test]
    fn enrich_is_idempotent() {
        let mut advisory =
            AdvisoryRecord::new("CVE-2024-0003", "The unmarshal() path in core_codec.rs");
        enrich(&mut advisory);
        let tokens = advisory.code_tokens.clone();
        let paths = advisory.relevant_paths.clone();

        enrich(&mut advisory);
        assert_eq!(advisory.code_tokens, tokens);
        assert_eq!(advisory.relevant_paths, paths);
    }

    #[test]
    fn empty_description_yields_no_tokens() {
        let mut advisory = AdvisoryRecord::new("CVE-2024-0004", "");
        enrich(&mut advisory);
        assert!(advisory.code_tokens.is_empty());
        assert!(advisory.relevant_paths.is_empty());
    }
}
