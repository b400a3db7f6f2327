//! 실행 캐시 — git 외부 도구 호출 및 결과 메모이제이션
//!
//! [`GitRunner`]는 작업 디렉토리를 검증한 뒤 git 프로세스를 실행하고,
//! 표준 출력을 줄 단위로 반환합니다. 0이 아닌 종료 코드는
//! [`RepoMinerError::Tool`]로, 데드라인 초과는 [`RepoMinerError::Timeout`]으로
//! 표면화됩니다.
//!
//! # 캐싱
//!
//! [`run_cached`](GitRunner::run_cached)는 동일한 `(인자, 작업 디렉토리)` 쌍의
//! 결과를 프로세스 수명 동안 메모이즈합니다. 부수효과가 있는 명령
//! (clone, fetch 등)에는 절대 사용하면 안 됩니다. 캐시 뮤텍스를 실행 동안
//! 유지하므로 같은 러너에 대한 캐시 호출은 직렬화됩니다 — 동일 엔트리의
//! 동시 변경은 발생하지 않습니다.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::{debug, trace};

use fixtrace_core::metrics as m;

use crate::error::RepoMinerError;

/// 자식 프로세스 종료 폴링 간격
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// git 명령 러너 + 실행 캐시
#[derive(Debug)]
pub struct GitRunner {
    /// 실행할 프로그램 (운영 환경에서는 항상 "git")
    program: String,
    /// 명령 데드라인
    timeout: Duration,
    /// (인자, 작업 디렉토리) -> 출력 줄 캐시
    cache: Mutex<HashMap<(Vec<String>, PathBuf), Arc<Vec<String>>>>,
}

impl GitRunner {
    /// git을 실행하는 러너를 생성합니다.
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("git", timeout)
    }

    /// 임의의 프로그램을 실행하는 러너를 생성합니다 (테스트용).
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 설정된 데드라인을 반환합니다.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 명령을 실행하고 stdout을 줄 단위로 반환합니다.
    ///
    /// 작업 디렉토리는 절대 경로이며 이미 존재해야 합니다.
    /// 그렇지 않으면 프로세스를 생성하기 전에 `Config` 에러로 즉시 실패합니다.
    pub fn run(&self, args: &[&str], cwd: &Path) -> Result<Vec<String>, RepoMinerError> {
        self.validate_cwd(cwd)?;

        let command_line = self.render_command(args);
        trace!(command = %command_line, cwd = %cwd.display(), "running git command");

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RepoMinerError::Io {
                path: self.program.clone(),
                source: e,
            })?;

        // 파이프가 가득 차 블로킹되지 않도록 리더 스레드로 출력을 소비하면서
        // 종료를 폴링한다
        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr piped");
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout_pipe.read_to_string(&mut buf);
            buf
        });
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr_pipe.read_to_string(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait().map_err(|e| RepoMinerError::Io {
                path: self.program.clone(),
                source: e,
            })? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        counter!(m::REPO_MINER_GIT_COMMANDS_TOTAL, m::LABEL_RESULT => "failure")
                            .increment(1);
                        return Err(RepoMinerError::Timeout {
                            command: command_line,
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            counter!(m::REPO_MINER_GIT_COMMANDS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
            return Err(RepoMinerError::Tool {
                command: command_line,
                exit_code: status.code().unwrap_or(-1),
                stderr: stderr.trim_end().to_owned(),
            });
        }

        counter!(m::REPO_MINER_GIT_COMMANDS_TOTAL, m::LABEL_RESULT => "success").increment(1);
        Ok(stdout.lines().map(str::to_owned).collect())
    }

    /// 명령을 실행하되, 동일한 호출이면 메모이즈된 결과를 반환합니다.
    ///
    /// 읽기 전용 명령에만 사용해야 합니다. 상태를 변경하는 명령을 캐시하면
    /// 두 번째 호출부터 실제 실행이 일어나지 않습니다.
    pub fn run_cached(
        &self,
        args: &[&str],
        cwd: &Path,
    ) -> Result<Arc<Vec<String>>, RepoMinerError> {
        let key = (
            args.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>(),
            cwd.to_path_buf(),
        );

        let mut cache = self.cache.lock().expect("exec cache mutex poisoned");
        if let Some(lines) = cache.get(&key) {
            counter!(m::REPO_MINER_CACHE_HITS_TOTAL).increment(1);
            debug!(command = %self.render_command(args), "exec cache hit");
            return Ok(Arc::clone(lines));
        }

        let lines = Arc::new(self.run(args, cwd)?);
        cache.insert(key, Arc::clone(&lines));
        Ok(lines)
    }

    /// 캐시된 엔트리 수를 반환합니다.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().expect("exec cache mutex poisoned").len()
    }

    /// 로깅/에러 메시지용 명령 문자열을 만듭니다.
    fn render_command(&self, args: &[&str]) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend_from_slice(args);
        parts.join(" ")
    }

    /// 작업 디렉토리가 절대 경로이고 존재하는지 검증합니다.
    fn validate_cwd(&self, cwd: &Path) -> Result<(), RepoMinerError> {
        if !cwd.is_absolute() {
            return Err(RepoMinerError::Config {
                field: "working_directory".to_owned(),
                reason: format!("'{}' is not an absolute path", cwd.display()),
            });
        }
        if !cwd.is_dir() {
            return Err(RepoMinerError::Config {
                field: "working_directory".to_owned(),
                reason: format!("'{}' does not exist or is not a directory", cwd.display()),
            });
        }
        Ok(())
    }
}
