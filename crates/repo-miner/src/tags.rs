//! 버전-태그 리졸버 — 자유 형식 버전 구간을 저장소 태그로 해석
//!
//! 태그 이름 체계는 저장소마다 제각각입니다 (`v1.2.3`, `rel/2.7`,
//! `docker-plugin-1.1.4`, `1.9` 등). 이 모듈은 태그에서 점으로 구분된
//! 숫자 부분 문자열을 추출하고, 성분 단위 숫자 비교로
//! (`"1.9" < "1.10"`, 사전순 비교 금지) 어드바이저리의 버전 구간을
//! 가장 근접하게 bound하는 태그 쌍을 찾습니다.
//!
//! # 동점 규칙
//!
//! 같은 숫자 버전을 가진 태그가 여러 개면 (release-train 접두사 등)
//! 벗겨낸 접두사가 가장 짧은 태그를, 그다음 사전순으로 가장 작은
//! 태그를 선택합니다.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use fixtrace_core::types::VersionInterval;

use crate::error::RepoMinerError;

/// 태그 내 점 구분 숫자 부분 문자열
static VERSION_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)*").expect("version run regex is valid"));

/// 버전이 추출된 태그
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVersion {
    /// 원본 태그 이름
    pub tag: String,
    /// 숫자 버전 앞의 접두사 (동점 규칙에 사용)
    pub prefix: String,
    /// 추출된 버전 부분 문자열 (예: "1.1.4")
    pub version: String,
    /// 숫자 성분 (예: [1, 1, 4])
    pub components: Vec<u64>,
}

/// 해석된 태그 구간
///
/// `from_tag`가 `None`이면 저장소 루트부터, `to_tag`가 `None`이면
/// HEAD까지를 의미합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterval {
    /// 하한 태그 (마지막 취약 버전에 대응)
    pub from_tag: Option<String>,
    /// 상한 태그 (수정 버전에 대응)
    pub to_tag: Option<String>,
}

/// 태그 이름에서 버전을 추출합니다.
///
/// 숫자가 전혀 없는 태그는 `None`을 반환하며 해석 대상에서 제외됩니다.
pub fn extract_version(tag: &str) -> Option<TagVersion> {
    let m = VERSION_RUN.find(tag)?;
    let components = parse_components(m.as_str())?;
    Some(TagVersion {
        tag: tag.to_owned(),
        prefix: tag[..m.start()].to_owned(),
        version: m.as_str().to_owned(),
        components,
    })
}

/// 점 구분 숫자 문자열을 성분 벡터로 파싱합니다.
fn parse_components(version: &str) -> Option<Vec<u64>> {
    let m = VERSION_RUN.find(version)?;
    m.as_str()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// 성분 단위 숫자 비교 (짧은 쪽은 0으로 패딩)
///
/// `[1, 3]`과 `[1, 3, 0]`은 같다고 판정합니다. 동점은 호출부의
/// 접두사/사전순 규칙으로 해소됩니다.
pub fn compare_components(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let ca = a.get(i).copied().unwrap_or(0);
        let cb = b.get(i).copied().unwrap_or(0);
        match ca.cmp(&cb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// 두 버전 문자열을 비교합니다.
///
/// 양쪽 모두 완전한 SemVer이면 `semver` 크레이트로 비교하고,
/// 아니면 추출된 숫자 성분으로 비교합니다. 어느 쪽도 숫자를 담고
/// 있지 않으면 `None`을 반환합니다.
pub fn compare_version_strings(a: &str, b: &str) -> Option<Ordering> {
    if let (Ok(va), Ok(vb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return Some(va.cmp(&vb));
    }
    let ca = parse_components(a)?;
    let cb = parse_components(b)?;
    Some(compare_components(&ca, &cb))
}

/// 버전 구간을 태그 쌍으로 해석합니다.
///
/// - 하한 `A`: `A`를 초과하지 않는 가장 큰 버전의 태그. `A`가 비어 있으면
///   저장소 루트 (`from_tag = None`)
/// - 상한 `B`: `B` 이상인 가장 작은 버전의 태그. `B`가 비어 있으면
///   가장 최근 태그 (입력 목록의 마지막 — 목록은 날짜 오름차순이어야 함)
///
/// # Errors
///
/// 요청된 경계와 비교 가능한 태그가 하나도 없으면
/// [`RepoMinerError::NoMatchingTag`]를 반환합니다. 호출자는 전체 히스토리
/// 스캔으로 폴백할 수 있습니다.
pub fn resolve_interval(
    interval: &VersionInterval,
    tags: &[String],
) -> Result<ResolvedInterval, RepoMinerError> {
    let versioned: Vec<TagVersion> = tags.iter().filter_map(|t| extract_version(t)).collect();

    let from_tag = match &interval.vulnerable {
        None => None,
        Some(bound) => Some(resolve_lower(bound, &versioned).ok_or_else(|| {
            RepoMinerError::NoMatchingTag {
                bound: bound.clone(),
                interval: interval.to_string(),
            }
        })?),
    };

    let to_tag = match &interval.fixed {
        None => tags.last().cloned(),
        Some(bound) => Some(resolve_upper(bound, &versioned).ok_or_else(|| {
            RepoMinerError::NoMatchingTag {
                bound: bound.clone(),
                interval: interval.to_string(),
            }
        })?),
    };

    Ok(ResolvedInterval { from_tag, to_tag })
}

/// 경계 `bound`를 초과하지 않는 가장 큰 버전의 태그를 찾습니다.
fn resolve_lower(bound: &str, versioned: &[TagVersion]) -> Option<String> {
    parse_components(bound)?;
    versioned
        .iter()
        .filter(|tv| {
            matches!(
                compare_version_strings(&tv.version, bound),
                Some(Ordering::Less | Ordering::Equal)
            )
        })
        .max_by(|a, b| {
            compare_components(&a.components, &b.components)
                // 선호하는 쪽(짧은 접두사, 사전순으로 작은 태그)이 Greater가 되도록 반전
                .then_with(|| b.prefix.len().cmp(&a.prefix.len()))
                .then_with(|| b.tag.cmp(&a.tag))
        })
        .map(|tv| tv.tag.clone())
}

/// 경계 `bound` 이상인 가장 작은 버전의 태그를 찾습니다.
fn resolve_upper(bound: &str, versioned: &[TagVersion]) -> Option<String> {
    parse_components(bound)?;
    versioned
        .iter()
        .filter(|tv| {
            matches!(
                compare_version_strings(&tv.version, bound),
                Some(Ordering::Greater | Ordering::Equal)
            )
        })
        .min_by(|a, b| {
            compare_components(&a.components, &b.components)
                .then_with(|| a.prefix.len().cmp(&b.prefix.len()))
                .then_with(|| a.tag.cmp(&b.tag))
        })
        .map(|tv| tv.tag.clone())
}
