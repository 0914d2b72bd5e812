//! Version workflow tests against real git repositories.
//!
//! Each test builds a throwaway repository with a committed `version.yml`
//! and drives the binary through it. Tests are skipped when `git` is not
//! installed.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tempfile::TempDir;

const VERSION_YML: &str = r"version: '1.0.0'
default:
  versionSchema: '{major}.{minor}.{patch}[-]{branch}[.]{commitShortHash}'
  newTagSchema: 'v{major}.{minor}.{patch}'
  precision: minor
  prereleaseTag: local
  release:
    match:
      - ^v.*
    newBranchSchema: release/v{major}.{minor}.{patch}
    newTagSchema: 'v{major}.{minor}.{patch}-final'
    versionSchema: '{major}.{minor}.{patch}'
branches:
  release:
    match:
      - ^release/v.*
    versionSchema: '{major}.{minor}.{patch}-{prereleaseTag}-{commitShortHash}'
    precision: patch
    prereleaseTag: rc
  feature:
    match:
      - ^feature/
    newBranchSchema: 'feature/{major}.{minor}-next'
  support:
    match:
      - ^maint/
    newBranchSchema: 'support-{major}.{minor}'
";

fn git_available() -> bool {
    process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

struct Repo {
    tmp: TempDir,
}

impl Repo {
    /// A repository on branch `trunk` with `version.yml` committed.
    fn new() -> Option<Self> {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return None;
        }
        let repo = Self {
            tmp: TempDir::new().unwrap(),
        };
        repo.git(&["init", "--quiet", "--initial-branch=trunk"]);
        repo.git(&["config", "user.name", "Test"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["config", "tag.gpgsign", "false"]);
        fs::write(repo.path().join("version.yml"), VERSION_YML).unwrap();
        repo.git(&["add", "version.yml"]);
        repo.git(&["commit", "--quiet", "-m", "initial"]);
        Some(repo)
    }

    fn path(&self) -> &Path {
        self.tmp.path()
    }

    fn git(&self, args: &[&str]) -> String {
        let output = process::Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn hash(&self) -> String {
        self.git(&["rev-parse", "--short=7", "HEAD"])
    }

    #[allow(deprecated)]
    fn gitver(&self) -> Command {
        let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
        cmd.current_dir(self.path())
            .env("GITVER_LOG_DIR", std::env::temp_dir().join("gitver-test-logs"));
        cmd
    }

    fn get(&self, args: &[&str]) -> String {
        let output = self.gitver().arg("get").args(args).assert().success();
        String::from_utf8_lossy(&output.get_output().stdout)
            .trim()
            .to_string()
    }

    fn version_file(&self) -> String {
        fs::read_to_string(self.path().join("version.yml")).unwrap()
    }
}

// =============================================================================
// get
// =============================================================================

#[test]
fn get_on_trunk_uses_default_schema() {
    let Some(repo) = Repo::new() else { return };
    assert_eq!(repo.get(&[]), format!("1.0.0-trunk.{}", repo.hash()));
}

#[test]
fn get_on_feature_branch_replaces_slash() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["checkout", "--quiet", "-b", "feature/test"]);
    assert_eq!(repo.get(&[]), format!("1.0.0-feature-test.{}", repo.hash()));
}

#[test]
fn get_on_release_branch_uses_branch_rule() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["checkout", "--quiet", "-b", "release/v1.0.0"]);
    assert_eq!(repo.get(&[]), format!("1.0.0-rc-{}", repo.hash()));
}

#[test]
fn get_on_detached_release_tag_is_plain() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["tag", "v1.0.0"]);
    repo.git(&["checkout", "--quiet", "--detach", "v1.0.0"]);
    assert_eq!(repo.get(&[]), "1.0.0");
}

#[test]
fn get_on_dirty_tree_uses_placeholder() {
    let Some(repo) = Repo::new() else { return };
    fs::write(repo.path().join("scratch.txt"), "wip").unwrap();
    assert_eq!(repo.get(&[]), "1.0.0-trunk.dirty-repo");
    assert_eq!(repo.get(&["-i"]), format!("1.0.0-trunk.{}", repo.hash()));
}

#[test]
fn get_numeric() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["checkout", "--quiet", "-b", "feature/x"]);
    assert_eq!(repo.get(&["--numeric"]), "1.0.0");
}

#[test]
fn get_with_schema_override() {
    let Some(repo) = Repo::new() else { return };
    assert_eq!(repo.get(&["--schema", "v{major}[.]{build}"]), "v1");
}

#[test]
fn get_json_summary() {
    let Some(repo) = Repo::new() else { return };
    let stdout = repo.get(&["--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["version"], format!("1.0.0-trunk.{}", repo.hash()));
    assert_eq!(json["numeric_version"], "1.0.0");
    assert_eq!(json["rule"], "default");
    assert_eq!(json["branch"], "trunk");
    assert_eq!(json["dirty"], false);
    assert_eq!(json["semver"], true);
}

#[test]
fn get_debug_prints_tree_to_stderr() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["get", "--debug"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1.0.0-trunk."))
        .stderr(predicate::str::contains("search refs"))
        .stderr(predicate::str::contains("branch trunk"))
        .stderr(predicate::str::contains("rule"));
}

#[test]
fn get_from_subdirectory_finds_root_file() {
    let Some(repo) = Repo::new() else { return };
    let sub = repo.path().join("src").join("deep");
    fs::create_dir_all(&sub).unwrap();
    repo.gitver()
        .args(["-C", sub.to_str().unwrap(), "get", "-i"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1.0.0-trunk."));
}

#[test]
fn get_without_version_file_fails() {
    let Some(repo) = Repo::new() else { return };
    fs::remove_file(repo.path().join("version.yml")).unwrap();
    repo.gitver()
        .arg("get")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("version.yml"));
}

// =============================================================================
// set / bump
// =============================================================================

#[test]
fn set_rewrites_version_line() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver().args(["set", "2.1.0"]).assert().success();
    assert!(repo.version_file().starts_with("version: '2.1.0'\n"));
    assert!(repo.version_file().contains("prereleaseTag: local"));
    assert_eq!(repo.get(&["-i", "--numeric"]), "2.1.0");
}

#[test]
fn set_invalid_version_fails_without_writing() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["set", "1.x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not a valid version"));
    assert_eq!(repo.version_file(), VERSION_YML);
}

#[test]
fn bump_sequence() {
    let Some(repo) = Repo::new() else { return };
    let expectations = [
        ("minor", "1.1.0"),
        ("patch", "1.1.1"),
        ("major", "2.0.0"),
        ("build", "2.0.0.0"),
        ("patch", "2.0.1.0"),
    ];
    for (component, expected) in expectations {
        repo.gitver().args(["bump", component]).assert().success();
        assert!(
            repo.version_file()
                .starts_with(&format!("version: '{expected}'")),
            "after bump {component}"
        );
    }
}

#[test]
fn bump_invalid_component_fails() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["bump", "micro"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("micro"));
    assert_eq!(repo.version_file(), VERSION_YML);
}

// =============================================================================
// create
// =============================================================================

#[test]
fn create_tag_uses_new_tag_schema() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "tag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1.0.0"));
    assert_eq!(repo.git(&["tag", "--list"]), "v1.0.0");

    // Now HEAD carries a release tag, so the release rule applies
    assert_eq!(repo.get(&[]), "1.0.0");
}

#[test]
fn create_release_tag_uses_release_rule() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "tag", "--release", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "v1.0.0-final""#));
    assert_eq!(repo.git(&["tag", "--list"]), "v1.0.0-final");
}

#[test]
fn create_tag_twice_fails() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver().args(["create", "tag"]).assert().success();
    repo.gitver()
        .args(["create", "tag"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn create_branch_from_key() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "branch", "feature"])
        .assert()
        .success();
    assert_eq!(
        repo.git(&["branch", "--list", "feature/*"]).trim_start_matches("* ").trim(),
        "feature/1.0-next"
    );
    // Created without checkout
    assert_eq!(repo.git(&["rev-parse", "--abbrev-ref", "HEAD"]), "trunk");
}

#[test]
fn create_branch_without_key_uses_current_branch_entry() {
    let Some(repo) = Repo::new() else { return };
    // `support` never matches its own name, so only the key lookup finds it
    repo.git(&["checkout", "--quiet", "-b", "support"]);
    repo.gitver()
        .args(["create", "branch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("support-1.0"));
    assert_eq!(repo.git(&["branch", "--list", "support-1.0"]).trim(), "support-1.0");
    assert_eq!(repo.git(&["rev-parse", "--abbrev-ref", "HEAD"]), "support");
}

#[test]
fn create_branch_without_key_uses_matched_rule() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["checkout", "--quiet", "-b", "feature/login"]);
    repo.gitver().args(["create", "branch"]).assert().success();
    assert_eq!(
        repo.git(&["branch", "--list", "feature/1.0-next"]).trim(),
        "feature/1.0-next"
    );
}

#[test]
fn create_branch_without_key_or_schema_fails() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "branch"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("newBranchSchema"));
    assert_eq!(repo.git(&["branch", "--list"]), "* trunk");
}

#[test]
fn create_branch_unknown_key_fails() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "branch", "hotfix"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hotfix"));
}

#[test]
fn create_release_with_commit() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "release", "--commit"])
        .assert()
        .success();

    assert_eq!(repo.git(&["branch", "--list", "release/v1.0.0"]).trim(), "release/v1.0.0");
    assert!(repo.version_file().starts_with("version: '1.1.0'"));
    assert_eq!(
        repo.git(&["log", "-1", "--format=%s"]),
        "gitver: Set version 1.0.0 => 1.1.0"
    );
    assert_eq!(repo.git(&["status", "--porcelain"]), "");

    // The release branch still points at the old version
    repo.git(&["checkout", "--quiet", "release/v1.0.0"]);
    assert!(repo.version_file().starts_with("version: '1.0.0'"));
}

#[test]
fn create_release_with_custom_message() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver()
        .args(["create", "release", "--commit", "chore: {newVersion} (was {oldVersion})"])
        .assert()
        .success();
    assert_eq!(
        repo.git(&["log", "-1", "--format=%s"]),
        "chore: 1.1.0 (was 1.0.0)"
    );
}

#[test]
fn create_release_without_commit_leaves_change_unstaged() {
    let Some(repo) = Repo::new() else { return };
    repo.gitver().args(["create", "release"]).assert().success();
    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "initial");
    assert!(repo.git(&["status", "--porcelain"]).contains("version.yml"));
}

#[test]
fn create_release_existing_branch_changes_nothing() {
    let Some(repo) = Repo::new() else { return };
    repo.git(&["branch", "release/v1.0.0"]);
    repo.gitver()
        .args(["create", "release", "--commit"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(repo.version_file(), VERSION_YML);
    assert_eq!(repo.git(&["log", "-1", "--format=%s"]), "initial");
}

// =============================================================================
// init
// =============================================================================

#[test]
fn init_writes_template_once() {
    let tmp = TempDir::new().unwrap();
    let dir: PathBuf = tmp.path().to_path_buf();
    #[allow(deprecated)]
    let run = |args: &[&str]| {
        let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
        cmd.env("GITVER_LOG_DIR", std::env::temp_dir().join("gitver-test-logs"))
            .args(["-C", dir.to_str().unwrap(), "init"])
            .args(args)
            .assert()
    };

    run(&["--initial-version", "0.3.0"]).success();
    let text = fs::read_to_string(dir.join("version.yml")).unwrap();
    assert!(text.starts_with("---\nversion: '0.3.0'"));

    run(&[]).code(1).stderr(predicate::str::contains("--force"));
    run(&["--force", "--template", "local-minimal"]).success();
    let text = fs::read_to_string(dir.join("version.yml")).unwrap();
    assert!(text.contains("version: '0.0.1'"));
}
