//! End-to-end matching test against a throwaway git repository.
//!
//! Mirrors the full flow: clone, tag resolution, mining, preprocessing,
//! rule phases, ranking and event delivery.

use std::path::{Path, PathBuf};
use std::process::Command;

use fixtrace_core::pipeline::Pipeline;
use fixtrace_core::types::{AdvisoryRecord, VersionInterval};
use fixtrace_match_engine::{FixMatcherBuilder, MatchEngineConfig};
use fixtrace_repo_miner::RepoMinerConfig;

fn git(dir: &Path, date: &str, args: &[&str]) {
    let output = Command::new("git")
        .args(["-c", "user.name=fixtrace-test"])
        .args(["-c", "user.email=fixtrace-test@example.com"])
        .args(args)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// History: root commit (rel/2.6), fix commit (rel/2.7), docs commit (rel/2.8).
fn init_source_repo() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("source");
    std::fs::create_dir(&src).unwrap();

    git(&src, "2020-01-01 12:00:00 +0000", &["init", "--quiet"]);

    write(&src, "src/main.rs", "fn main() {}\n");
    git(&src, "2020-01-01 12:00:00 +0000", &["add", "."]);
    git(
        &src,
        "2020-01-01 12:00:00 +0000",
        &["commit", "--quiet", "-m", "Initial import"],
    );
    git(&src, "2020-01-01 12:00:00 +0000", &["tag", "rel/2.6"]);

    write(
        &src,
        "src/parser.rs",
        "pub fn parse(input: &str) -> &str {\n    input.trim()\n}\n",
    );
    git(&src, "2020-02-01 12:00:00 +0000", &["add", "."]);
    git(
        &src,
        "2020-02-01 12:00:00 +0000",
        &["commit", "--quiet", "-m", "Fix CVE-2020-26258 in parse()"],
    );
    git(&src, "2020-02-01 12:00:00 +0000", &["tag", "rel/2.7"]);

    write(&src, "docs/README.md", "# docs\n");
    git(&src, "2020-03-01 12:00:00 +0000", &["add", "."]);
    git(
        &src,
        "2020-03-01 12:00:00 +0000",
        &["commit", "--quiet", "-m", "Update docs"],
    );
    git(&src, "2020-03-01 12:00:00 +0000", &["tag", "rel/2.8"]);

    (dir, src)
}

fn advisory() -> AdvisoryRecord {
    AdvisoryRecord::new(
        "CVE-2020-26258",
        "Improper input handling in parse() allows crafted payloads. Affected file src/parser.rs.",
    )
    .with_interval(VersionInterval::parse(":2.7"))
}

#[tokio::test]
async fn empty_lower_bound_scenario_matches_the_fix_commit() {
    let (root, src) = init_source_repo();

    let (mut matcher, report_rx) = FixMatcherBuilder::new()
        .config(MatchEngineConfig::default())
        .repo_config(RepoMinerConfig {
            clone_dir: root.path().join("mirrors").display().to_string(),
            git_timeout_secs: 60,
            max_commits: 1000,
            cache_enabled: true,
        })
        .build()
        .unwrap();
    let mut report_rx = report_rx.unwrap();

    matcher.start().await.unwrap();

    let report = matcher
        .match_advisory(advisory(), &src.display().to_string())
        .await
        .unwrap();

    // Lower bound empty -> repository root; upper bound -> rel/2.7.
    // The window holds exactly the first two commits; rel/2.8 is excluded.
    assert!(!report.full_history_fallback);
    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.commits_skipped, 0);

    // The fix commit mentions the advisory id and touches the advisory path
    let top = report.top_candidate().unwrap();
    assert!(top.message.contains("CVE-2020-26258"));
    assert!(top.relevance > 0);
    assert!(top.annotations.iter().any(|a| a.rule_id == "REF_ADV_VULN_ID"));
    assert!(
        top.annotations
            .iter()
            .any(|a| a.rule_id == "CHANGES_RELEVANT_PATH")
    );

    // The commit touching no relevant path scores zero
    let other = &report.candidates[1];
    assert!(other.message.contains("Initial import"));
    assert_eq!(other.relevance, 0);

    // The same report is delivered as an event for downstream consumers
    let event = report_rx.recv().await.unwrap();
    assert_eq!(event.report.run_id, report.run_id);
    assert_eq!(event.report.candidates.len(), 2);

    matcher.stop().await.unwrap();
    assert_eq!(matcher.runs_completed(), 1);
}

#[tokio::test]
async fn unresolvable_interval_falls_back_to_full_history() {
    let (root, src) = init_source_repo();

    let (matcher, _report_rx) = FixMatcherBuilder::new()
        .repo_config(RepoMinerConfig {
            clone_dir: root.path().join("mirrors").display().to_string(),
            git_timeout_secs: 60,
            max_commits: 1000,
            cache_enabled: true,
        })
        .build()
        .unwrap();

    let record = AdvisoryRecord::new("CVE-2020-26258", "No matching versions here.")
        .with_interval(VersionInterval::parse("9.9:10.0"));

    let report = matcher
        .match_advisory(record, &src.display().to_string())
        .await
        .unwrap();

    // Fallback widens the window to the whole history (all three commits)
    assert!(report.full_history_fallback);
    assert_eq!(report.candidates.len(), 3);
}

#[tokio::test]
async fn stats_report_covers_mining_and_phases() {
    let (root, src) = init_source_repo();

    let (matcher, _report_rx) = FixMatcherBuilder::new()
        .repo_config(RepoMinerConfig {
            clone_dir: root.path().join("mirrors").display().to_string(),
            git_timeout_secs: 60,
            max_commits: 1000,
            cache_enabled: true,
        })
        .build()
        .unwrap();

    let report = matcher
        .match_advisory(advisory(), &src.display().to_string())
        .await
        .unwrap();

    let stats = &report.stats;
    assert_eq!(stats["mining"]["commits"], 2.0);
    assert_eq!(stats["mining"]["skipped"], 0.0);
    assert!(stats["phase"]["structural"].is_object());
    assert!(stats["phase"]["textual"]["rule"]["REF_ADV_VULN_ID"]["matches"].is_number());
    assert!(stats["run"]["duration_ms"].is_array());
}
