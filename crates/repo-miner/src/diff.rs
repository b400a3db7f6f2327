//! 통합 diff 파싱 — 헌크 헤더 추출
//!
//! `git diff` 출력의 `@@ -a,b +c,d @@` 헤더를 파싱하여
//! 변경 후 파일(post-image) 기준 [`Hunk`] 목록을 만듭니다.
//! 바이너리 파일은 변경 파일로는 기록되지만 헌크를 만들지 않습니다.

use std::sync::LazyLock;

use regex::Regex;

use fixtrace_core::types::Hunk;

/// 헌크 헤더 정규식
///
/// `+c,d`에서 `,d`가 생략되면 길이 1로 해석합니다 (git 규약).
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex is valid")
});

/// 통합 diff 텍스트에서 헌크 목록을 추출합니다.
///
/// diff에 등장하는 순서가 유지됩니다. 헌크 헤더 형식이 아닌 줄과
/// 바이너리 파일 표시(`Binary files ... differ`)는 무시합니다.
pub fn parse_hunks(diff: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();

    for line in diff.lines() {
        let Some(caps) = HUNK_HEADER.captures(line) else {
            continue;
        };

        let start_line: u32 = caps[1].parse().unwrap_or(0);
        let length: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(1);

        hunks.push(Hunk { start_line, length });
    }

    hunks
}

/// diff가 바이너리 파일 변경만 담고 있는지 반환합니다.
pub fn is_binary_only(diff: &str) -> bool {
    let mut saw_binary = false;
    for line in diff.lines() {
        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            saw_binary = true;
        }
        if HUNK_HEADER.is_match(line) {
            return false;
        }
    }
    saw_binary
}
