//! 저장소 마이너 — clone/open, 커밋 열거, 커밋 추출, 태그 목록
//!
//! [`Repository`]는 로컬 미러에 대한 핸들입니다. 코어는 초기 clone 이후
//! 작업 복사본을 읽기만 하므로 여러 매칭 실행이 같은 미러를 동시에
//! 읽어도 안전합니다.
//!
//! # 부분 실패 정책
//!
//! 개별 커밋의 추출 실패는 치명적이지 않습니다.
//! [`load_commits`](Repository::load_commits)는 실패한 커밋을 로그로 남기고
//! 건너뛴 수를 [`MiningReport::skipped`]로 보고합니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use fixtrace_core::metrics as m;
use fixtrace_core::types::RawCommit;

use crate::config::RepoMinerConfig;
use crate::diff::parse_hunks;
use crate::error::RepoMinerError;
use crate::exec::GitRunner;

/// 마이닝 결과 — 추출된 커밋과 건너뛴 커밋 수
#[derive(Debug, Default)]
pub struct MiningReport {
    /// 추출에 성공한 커밋 (입력 순서 유지)
    pub commits: Vec<RawCommit>,
    /// 추출 실패로 건너뛴 커밋 수
    pub skipped: usize,
}

/// 로컬 미러에 대한 읽기 전용 핸들
#[derive(Debug)]
pub struct Repository {
    /// 원본 저장소 URL
    url: String,
    /// 로컬 작업 디렉토리 (절대 경로)
    work_dir: PathBuf,
    /// git 명령 러너
    runner: GitRunner,
    /// 읽기 전용 열거 명령의 결과 캐싱 여부
    cache_enabled: bool,
}

impl Repository {
    /// 저장소를 열거나 새로 clone합니다 (멱등).
    ///
    /// `config.clone_dir` 아래에 URL에서 유도한 디렉토리명으로 미러를
    /// 보관합니다. 미러가 이미 존재하면 다시 fetch하지 않고 재사용합니다.
    ///
    /// # Errors
    ///
    /// clone 실패(네트워크/인증)는 [`RepoMinerError::Unavailable`]로 반환됩니다.
    pub fn open_or_clone(url: &str, config: &RepoMinerConfig) -> Result<Self, RepoMinerError> {
        config.validate()?;

        let clone_dir = PathBuf::from(&config.clone_dir);
        std::fs::create_dir_all(&clone_dir).map_err(|e| RepoMinerError::Io {
            path: clone_dir.display().to_string(),
            source: e,
        })?;
        // run()의 cwd 검증은 절대 경로를 요구한다
        let clone_dir = clone_dir.canonicalize().map_err(|e| RepoMinerError::Io {
            path: config.clone_dir.clone(),
            source: e,
        })?;

        let work_dir = clone_dir.join(mirror_dir_name(url));
        let runner = GitRunner::new(Duration::from_secs(config.git_timeout_secs));

        if work_dir.join(".git").is_dir() {
            info!(url, mirror = %work_dir.display(), "reusing existing mirror");
        } else {
            info!(url, mirror = %work_dir.display(), "cloning repository");
            let target = work_dir
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| RepoMinerError::Parse(format!("invalid mirror path for '{url}'")))?
                .to_owned();
            runner
                .run(&["clone", "--quiet", url, &target], &clone_dir)
                .map_err(|e| match e {
                    RepoMinerError::Tool { stderr, .. } => RepoMinerError::Unavailable {
                        url: url.to_owned(),
                        reason: stderr,
                    },
                    RepoMinerError::Timeout { timeout_secs, .. } => RepoMinerError::Unavailable {
                        url: url.to_owned(),
                        reason: format!("clone timed out after {timeout_secs}s"),
                    },
                    other => other,
                })?;
            counter!(m::REPO_MINER_CLONES_TOTAL).increment(1);
        }

        Ok(Self {
            url: url.to_owned(),
            work_dir,
            runner,
            cache_enabled: config.cache_enabled,
        })
    }

    /// 원본 저장소 URL을 반환합니다.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 로컬 작업 디렉토리를 반환합니다.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// 태그 목록을 태그/커밋 날짜 오름차순으로 반환합니다.
    pub fn tags(&self) -> Result<Vec<String>, RepoMinerError> {
        let lines = self.run_enumeration(&["tag", "--sort=creatordate"])?;
        Ok(lines)
    }

    /// 두 참조 사이에서 도달 가능한 커밋 해시를 최신순으로 열거합니다.
    ///
    /// `from`이 `None`이면 저장소 루트부터, `to`가 `None`이면 HEAD까지입니다.
    /// `max_commits`를 넘는 부분은 잘리며 로그로 남습니다.
    pub fn commits_in_range(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        max_commits: usize,
    ) -> Result<Vec<String>, RepoMinerError> {
        let to_ref = to.unwrap_or("HEAD");
        let mut args = vec!["rev-list", to_ref];
        if let Some(from_ref) = from {
            args.push("--not");
            args.push(from_ref);
        }

        let all = self.run_enumeration(&args)?;
        if all.len() > max_commits {
            warn!(
                total = all.len(),
                max = max_commits,
                "commit window exceeds max_commits, truncating"
            );
        }
        Ok(all.into_iter().take(max_commits).collect())
    }

    /// 커밋 하나를 완전히 추출합니다.
    ///
    /// 메시지와 author 타임스탬프, 첫 번째 부모 기준 diff(머지 커밋 포함),
    /// 변경 파일 목록, 헌크, 이 커밋을 포함하는 태그를 수집합니다.
    /// 바이너리 파일은 변경 파일로만 기록되고 헌크를 만들지 않습니다.
    pub fn load_commit(&self, id: &str) -> Result<RawCommit, RepoMinerError> {
        // 메타데이터: 첫 줄 = author 타임스탬프, 나머지 = 메시지 전문
        let meta = self
            .runner
            .run(&["log", "-n", "1", "--format=%at%n%B", id], &self.work_dir)?;
        let (timestamp_line, message_lines) = meta
            .split_first()
            .ok_or_else(|| RepoMinerError::Parse(format!("empty metadata for commit {id}")))?;
        let timestamp: i64 = timestamp_line
            .trim()
            .parse()
            .map_err(|_| RepoMinerError::Parse(format!("bad timestamp for commit {id}")))?;
        let message = message_lines.join("\n").trim_end().to_owned();

        // 첫 번째 부모 (머지 커밋은 첫 부모 기준으로 diff)
        let parents_line = self
            .runner
            .run(&["rev-list", "--parents", "-n", "1", id], &self.work_dir)?
            .into_iter()
            .next()
            .unwrap_or_default();
        let first_parent = parents_line.split_whitespace().nth(1).map(str::to_owned);

        let (diff_lines, files_lines) = match &first_parent {
            Some(parent) => (
                self.runner
                    .run(&["diff", "--no-color", parent, id], &self.work_dir)?,
                self.runner
                    .run(&["diff", "--name-only", parent, id], &self.work_dir)?,
            ),
            // 루트 커밋은 빈 트리와 비교
            None => (
                self.runner.run(
                    &["diff-tree", "-p", "--no-color", "--root", "--no-commit-id", id],
                    &self.work_dir,
                )?,
                self.runner.run(
                    &["diff-tree", "--name-only", "-r", "--root", "--no-commit-id", id],
                    &self.work_dir,
                )?,
            ),
        };

        let diff = diff_lines.join("\n");
        let hunks = parse_hunks(&diff);
        let changed_files: Vec<String> =
            files_lines.into_iter().filter(|l| !l.is_empty()).collect();

        let tags = self
            .run_enumeration(&["tag", "--contains", id])
            .unwrap_or_else(|e| {
                debug!(commit = id, error = %e, "tag lookup failed, recording no tags");
                Vec::new()
            });

        Ok(RawCommit {
            repository_url: self.url.clone(),
            commit_id: id.to_owned(),
            timestamp,
            message,
            hunks,
            changed_files,
            diff,
            tags,
        })
    }

    /// 커밋 목록을 일괄 추출합니다 (부분 실패 허용).
    pub fn load_commits(&self, ids: &[String]) -> MiningReport {
        let mut report = MiningReport::default();

        for id in ids {
            match self.load_commit(id) {
                Ok(commit) => {
                    counter!(m::REPO_MINER_COMMITS_EXTRACTED_TOTAL).increment(1);
                    report.commits.push(commit);
                }
                Err(e) => {
                    warn!(commit = %id, error = %e, "failed to extract commit, skipping");
                    counter!(m::REPO_MINER_COMMITS_SKIPPED_TOTAL).increment(1);
                    report.skipped += 1;
                }
            }
        }

        info!(
            extracted = report.commits.len(),
            skipped = report.skipped,
            "commit extraction finished"
        );
        report
    }

    /// 읽기 전용 열거 명령을 실행합니다 (설정에 따라 캐시 사용).
    ///
    /// diff 출력처럼 큰 결과는 캐시하지 않고, 태그/리비전 열거만 캐시합니다.
    fn run_enumeration(&self, args: &[&str]) -> Result<Vec<String>, RepoMinerError> {
        if self.cache_enabled {
            Ok(self.runner.run_cached(args, &self.work_dir)?.to_vec())
        } else {
            self.runner.run(args, &self.work_dir)
        }
    }
}

/// URL에서 미러 디렉토리명을 유도합니다.
///
/// 경로 구분자와 URL 특수문자를 `-`로 바꿔 단일 디렉토리명으로 만듭니다.
fn mirror_dir_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    let mut name: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' })
        .collect();
    while name.contains("--") {
        name = name.replace("--", "-");
    }
    name.trim_matches('-').to_owned()
}
