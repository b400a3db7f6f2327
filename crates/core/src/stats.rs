//! 실행 통계 수집기 — 매칭 실행 단위의 계층형 북키핑
//!
//! [`ExecutionStats`]는 점(.)으로 구분된 경로 아래에 숫자 시계열을 기록합니다.
//! 단계/규칙별 매칭 횟수와 소요 시간을 관측하기 위한 순수 북키핑이며,
//! 매칭 결과에는 절대 영향을 주지 않습니다.
//!
//! # 연산
//!
//! - [`record`](ExecutionStats::record): 스칼라를 정확히 한 번 기록
//!   (같은 경로에 두 번 기록하면 panic — 단계 배선 버그)
//! - [`append`](ExecutionStats::append): 시계열에 무제한 추가
//! - [`add_to_last`](ExecutionStats::add_to_last): 마지막 기록 값에 델타 가산
//!
//! # 사용 예시
//!
//! ```
//! use std::time::Instant;
//! use fixtrace_core::stats::ExecutionStats;
//!
//! let mut stats = ExecutionStats::new();
//! let started = Instant::now();
//! // ... 단계 실행 ...
//! stats.record("phase.structural.candidates", 42.0);
//! stats.append_duration("phase.structural.duration_ms", started.elapsed());
//! stats.add_to_last("phase.structural.candidates", 1.0);
//!
//! let tree = stats.to_json_tree();
//! assert!(tree["phase"]["structural"]["candidates"].is_number());
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

/// 경로 하나에 기록되는 엔트리
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatEntry {
    /// 한 번만 기록되는 스칼라
    Scalar(f64),
    /// 무제한으로 자라는 시계열
    Series(Vec<f64>),
}

/// 매칭 실행 하나에 귀속되는 통계 수집기
///
/// 실행 간에 공유되지 않으며, 전역 싱글턴이 아니라 명시적 컨텍스트로
/// 각 단계에 전달됩니다. 중복 `record`와 경로 충돌(같은 이름이 리프이자
/// 브랜치인 경우)은 프로그래머 에러이므로 즉시 panic합니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionStats {
    entries: BTreeMap<String, StatEntry>,
}

impl ExecutionStats {
    /// 빈 수집기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 경로 아래에 스칼라를 정확히 한 번 기록합니다.
    ///
    /// # Panics
    ///
    /// 같은 경로에 이미 값이 있으면 panic합니다. 이는 단계 배선 버그를
    /// 나타내는 프로그래머 에러이며 런타임 데이터 문제가 아닙니다.
    pub fn record(&mut self, path: &str, value: f64) {
        self.assert_path_free(path);
        self.entries.insert(path.to_owned(), StatEntry::Scalar(value));
    }

    /// 경로 아래의 시계열에 값을 추가합니다.
    ///
    /// 경로가 비어 있으면 새 시계열을 만듭니다.
    ///
    /// # Panics
    ///
    /// 경로에 스칼라가 이미 기록되어 있으면 panic합니다.
    pub fn append(&mut self, path: &str, value: f64) {
        match self.entries.get_mut(path) {
            Some(StatEntry::Series(series)) => series.push(value),
            Some(StatEntry::Scalar(_)) => {
                panic!("stats path '{path}' already holds a scalar, cannot append")
            }
            None => {
                self.assert_branch_free(path);
                self.entries
                    .insert(path.to_owned(), StatEntry::Series(vec![value]));
            }
        }
    }

    /// 시계열에 소요 시간을 밀리초 단위로 추가합니다.
    pub fn append_duration(&mut self, path: &str, elapsed: Duration) {
        self.append(path, elapsed.as_secs_f64() * 1000.0);
    }

    /// 마지막으로 기록/추가된 값에 델타를 가산합니다.
    ///
    /// # Panics
    ///
    /// 경로가 존재하지 않거나 시계열이 비어 있으면 panic합니다.
    pub fn add_to_last(&mut self, path: &str, delta: f64) {
        match self.entries.get_mut(path) {
            Some(StatEntry::Scalar(value)) => *value += delta,
            Some(StatEntry::Series(series)) => match series.last_mut() {
                Some(last) => *last += delta,
                None => panic!("stats path '{path}' holds an empty series"),
            },
            None => panic!("stats path '{path}' has no recorded value"),
        }
    }

    /// 경로의 현재 값을 반환합니다.
    pub fn get(&self, path: &str) -> Option<&StatEntry> {
        self.entries.get(path)
    }

    /// 기록된 경로 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 아무것도 기록되지 않았는지 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 점 구분 경로를 중첩 JSON 트리로 변환합니다.
    ///
    /// 관측 협력자가 렌더링하거나 저장할 수 있는 형태입니다.
    pub fn to_json_tree(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for (path, entry) in &self.entries {
            let mut node = &mut root;
            let mut segments = path.split('.').peekable();
            while let Some(segment) = segments.next() {
                if segments.peek().is_none() {
                    let leaf = match entry {
                        StatEntry::Scalar(v) => serde_json::json!(v),
                        StatEntry::Series(s) => serde_json::json!(s),
                    };
                    node.insert(segment.to_owned(), leaf);
                } else {
                    node = node
                        .entry(segment.to_owned())
                        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()))
                        .as_object_mut()
                        .expect("branch segment collides with a leaf");
                }
            }
        }
        serde_json::Value::Object(root)
    }

    /// 경로가 비어 있고 리프/브랜치 충돌이 없는지 단언합니다.
    fn assert_path_free(&self, path: &str) {
        if self.entries.contains_key(path) {
            panic!("duplicate stats record at '{path}'");
        }
        self.assert_branch_free(path);
    }

    /// 경로가 기존 리프의 하위 경로가 아니고, 기존 경로의 상위도 아닌지 단언합니다.
    fn assert_branch_free(&self, path: &str) {
        let prefix = format!("{path}.");
        if self.entries.keys().any(|k| k.starts_with(&prefix)) {
            panic!("stats path '{path}' collides with an existing branch");
        }
        for (i, _) in path.match_indices('.') {
            let ancestor = &path[..i];
            if self.entries.contains_key(ancestor) {
                panic!("stats path '{path}' collides with existing leaf '{ancestor}'");
            }
        }
    }
}
