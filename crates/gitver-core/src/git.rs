//! Git access for version resolution.
//!
//! [`GitCli`] shells out to `git` for all operations. This ensures we inherit
//! the user's identity, signing, hooks, and other configuration. Callers go
//! through the [`VcsProvider`] trait so resolution can be exercised against
//! the in-memory [`StaticVcs`].

use std::cell::RefCell;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` is not on the `PATH`.
    #[error("git is not installed or not on PATH")]
    NotInstalled,

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "status").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// `HEAD` does not point at a commit yet.
    #[error("the repository has no commits yet")]
    NoCommits,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Where a ref name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// A tag pointing at `HEAD`.
    Tag,
    /// The checked-out branch.
    Branch,
}

/// A ref name that rule patterns are tried against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRef {
    /// Ref name.
    pub name: String,
    /// Tag or branch.
    pub kind: RefKind,
}

/// Repository state captured once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VcsSnapshot {
    /// Checked-out branch, or `HEAD` when detached.
    pub branch_name: String,
    /// Tags pointing at `HEAD`.
    pub tag_names: Vec<String>,
    /// Abbreviated `HEAD` commit hash.
    pub commit_short_hash: String,
    /// `HEAD` is not on a branch.
    pub is_detached_head: bool,
    /// The working tree has staged, unstaged, or untracked changes.
    pub is_dirty: bool,
}

impl VcsSnapshot {
    /// Refs that rule patterns are tried against, in order.
    ///
    /// Tags come first. The branch is included only when `HEAD` is attached.
    pub fn search_refs(&self) -> Vec<SearchRef> {
        let tags = self.tag_names.iter().map(|name| SearchRef {
            name: name.clone(),
            kind: RefKind::Tag,
        });
        let branch = (!self.is_detached_head).then(|| SearchRef {
            name: self.branch_name.clone(),
            kind: RefKind::Branch,
        });
        tags.chain(branch).collect()
    }
}

/// Read and write access to the repository.
pub trait VcsProvider {
    /// Top-level directory of the working tree.
    fn repo_root(&self) -> GitResult<Utf8PathBuf>;

    /// Capture branch, tags, hash, and cleanliness.
    fn snapshot(&self) -> GitResult<VcsSnapshot>;

    /// Whether a local branch named `name` exists.
    fn branch_exists(&self, name: &str) -> GitResult<bool>;

    /// Whether a tag named `name` exists.
    fn tag_exists(&self, name: &str) -> GitResult<bool>;

    /// Create a branch at `HEAD` without checking it out.
    fn create_branch(&self, name: &str) -> GitResult<()>;

    /// Create a lightweight tag at `HEAD`.
    fn create_tag(&self, name: &str) -> GitResult<()>;

    /// Stage `path` and commit it alone with `message`.
    fn commit_file(&self, path: &Utf8Path, message: &str) -> GitResult<()>;
}

/// [`VcsProvider`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: Utf8PathBuf,
}

impl GitCli {
    /// Run git commands from `workdir`.
    pub fn new(workdir: impl Into<Utf8PathBuf>) -> GitResult<Self> {
        if which::which("git").is_err() {
            return Err(GitError::NotInstalled);
        }
        Ok(Self {
            workdir: workdir.into(),
        })
    }

    /// Check if the working directory is inside a git work tree.
    #[instrument(skip(self), fields(workdir = %self.workdir))]
    pub fn is_inside_repo(&self) -> GitResult<bool> {
        match self.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check whether the working tree is clean.
    ///
    /// Untracked files count as changes.
    #[instrument(skip(self))]
    pub fn is_clean(&self) -> GitResult<bool> {
        let output = self.git(&["status", "--porcelain"])?;
        let clean = output.trim().is_empty();
        debug!(clean, "working tree status");
        Ok(clean)
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if in a detached HEAD state.
    #[instrument(skip(self))]
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let output = match self.git(&["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(output) => output,
            Err(GitError::Command { stderr, .. }) if is_unborn(&stderr) => {
                return Err(GitError::NoCommits);
            }
            Err(e) => return Err(e),
        };
        let branch = output.trim().to_string();
        if branch == "HEAD" {
            debug!("detached HEAD");
            Ok(None)
        } else {
            debug!(%branch, "current branch");
            Ok(Some(branch))
        }
    }

    /// Abbreviated (7 character) hash of `HEAD`.
    #[instrument(skip(self))]
    pub fn short_hash(&self) -> GitResult<String> {
        match self.git(&["rev-parse", "--short=7", "HEAD"]) {
            Ok(output) => Ok(output.trim().to_string()),
            Err(GitError::Command { stderr, .. }) if is_unborn(&stderr) => Err(GitError::NoCommits),
            Err(e) => Err(e),
        }
    }

    /// Tags pointing at `HEAD`, in git's listing order.
    #[instrument(skip(self))]
    pub fn tags_at_head(&self) -> GitResult<Vec<String>> {
        let output = self.git(&["tag", "--points-at", "HEAD"])?;
        let tags: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(?tags, "tags at HEAD");
        Ok(tags)
    }

    fn ref_exists(&self, full_ref: &str) -> GitResult<bool> {
        match self.git(&["show-ref", "--verify", "--quiet", full_ref]) {
            Ok(_) => Ok(true),
            Err(GitError::Command { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn has_identity(&self) -> bool {
        self.git(&["config", "user.name"])
            .is_ok_and(|name| !name.trim().is_empty())
    }

    /// Run a git command and return its stdout.
    fn git(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.workdir.as_std_path())
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }

            Err(GitError::Command {
                command: args.first().unwrap_or(&"").to_string(),
                stderr,
            })
        }
    }
}

impl VcsProvider for GitCli {
    #[instrument(skip(self), fields(workdir = %self.workdir))]
    fn repo_root(&self) -> GitResult<Utf8PathBuf> {
        let output = self.git(&["rev-parse", "--show-toplevel"])?;
        let root = Utf8PathBuf::from(output.trim());
        debug!(%root, "repository root");
        Ok(root)
    }

    #[instrument(skip(self), fields(workdir = %self.workdir))]
    fn snapshot(&self) -> GitResult<VcsSnapshot> {
        let branch = self.current_branch()?;
        let snapshot = VcsSnapshot {
            is_detached_head: branch.is_none(),
            branch_name: branch.unwrap_or_else(|| "HEAD".to_string()),
            tag_names: self.tags_at_head()?,
            commit_short_hash: self.short_hash()?,
            is_dirty: !self.is_clean()?,
        };
        debug!(?snapshot, "repository snapshot");
        Ok(snapshot)
    }

    fn branch_exists(&self, name: &str) -> GitResult<bool> {
        self.ref_exists(&format!("refs/heads/{name}"))
    }

    fn tag_exists(&self, name: &str) -> GitResult<bool> {
        self.ref_exists(&format!("refs/tags/{name}"))
    }

    #[instrument(skip(self))]
    fn create_branch(&self, name: &str) -> GitResult<()> {
        self.git(&["branch", name])?;
        debug!(%name, "branch created");
        Ok(())
    }

    #[instrument(skip(self))]
    fn create_tag(&self, name: &str) -> GitResult<()> {
        self.git(&["tag", name])?;
        debug!(%name, "tag created");
        Ok(())
    }

    #[instrument(skip(self, message), fields(path = %path))]
    fn commit_file(&self, path: &Utf8Path, message: &str) -> GitResult<()> {
        self.git(&["add", "--", path.as_str()])?;

        let mut args = Vec::new();
        if !self.has_identity() {
            debug!("no git identity configured, committing as gitver");
            args.extend(["-c", "user.name=gitver", "-c", "user.email=gitver@localhost"]);
        }
        args.extend(["commit", "--quiet", "-m", message, "--", path.as_str()]);
        self.git(&args)?;
        debug!("version file committed");
        Ok(())
    }
}

fn is_unborn(stderr: &str) -> bool {
    stderr.contains("unknown revision")
        || stderr.contains("ambiguous argument 'HEAD'")
        || stderr.contains("does not have any commits")
}

/// Writes recorded by [`StaticVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    /// `create_branch`
    Branch(String),
    /// `create_tag`
    Tag(String),
    /// `commit_file`
    Commit {
        /// Committed file.
        path: Utf8PathBuf,
        /// Commit message.
        message: String,
    },
}

/// In-memory [`VcsProvider`] with a fixed snapshot. Writes are recorded
/// instead of performed.
#[derive(Debug, Default)]
pub struct StaticVcs {
    root: Utf8PathBuf,
    snapshot: VcsSnapshot,
    existing_branches: Vec<String>,
    writes: RefCell<Vec<RecordedWrite>>,
}

impl StaticVcs {
    /// A repository rooted at `root` whose state is `snapshot`.
    pub fn new(root: impl Into<Utf8PathBuf>, snapshot: VcsSnapshot) -> Self {
        Self {
            root: root.into(),
            snapshot,
            ..Self::default()
        }
    }

    /// Pretend `name` already exists as a local branch.
    #[must_use]
    pub fn with_branch(mut self, name: impl Into<String>) -> Self {
        self.existing_branches.push(name.into());
        self
    }

    /// Writes performed so far.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }
}

impl VcsProvider for StaticVcs {
    fn repo_root(&self) -> GitResult<Utf8PathBuf> {
        Ok(self.root.clone())
    }

    fn snapshot(&self) -> GitResult<VcsSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn branch_exists(&self, name: &str) -> GitResult<bool> {
        let created = self
            .writes
            .borrow()
            .iter()
            .any(|w| matches!(w, RecordedWrite::Branch(b) if b == name));
        Ok(created || self.existing_branches.iter().any(|b| b == name))
    }

    fn tag_exists(&self, name: &str) -> GitResult<bool> {
        let created = self
            .writes
            .borrow()
            .iter()
            .any(|w| matches!(w, RecordedWrite::Tag(t) if t == name));
        Ok(created || self.snapshot.tag_names.iter().any(|t| t == name))
    }

    fn create_branch(&self, name: &str) -> GitResult<()> {
        self.writes
            .borrow_mut()
            .push(RecordedWrite::Branch(name.to_string()));
        Ok(())
    }

    fn create_tag(&self, name: &str) -> GitResult<()> {
        self.writes
            .borrow_mut()
            .push(RecordedWrite::Tag(name.to_string()));
        Ok(())
    }

    fn commit_file(&self, path: &Utf8Path, message: &str) -> GitResult<()> {
        self.writes.borrow_mut().push(RecordedWrite::Commit {
            path: path.to_path_buf(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    fn run(dir: &Utf8Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn init_repo() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        run(&dir, &["init", "--quiet", "--initial-branch=trunk"]);
        run(&dir, &["config", "user.name", "Test"]);
        run(&dir, &["config", "user.email", "test@example.com"]);
        run(&dir, &["config", "commit.gpgsign", "false"]);
        run(&dir, &["config", "tag.gpgsign", "false"]);
        std::fs::write(dir.join("README"), "hello\n").unwrap();
        run(&dir, &["add", "README"]);
        run(&dir, &["commit", "--quiet", "-m", "init"]);
        (tmp, dir)
    }

    #[test]
    fn search_refs_puts_tags_before_branch() {
        let snapshot = VcsSnapshot {
            branch_name: "trunk".into(),
            tag_names: vec!["v1.0.0".into()],
            ..VcsSnapshot::default()
        };
        let refs = snapshot.search_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, RefKind::Tag);
        assert_eq!(refs[1].name, "trunk");
    }

    #[test]
    fn search_refs_detached_is_tags_only() {
        let snapshot = VcsSnapshot {
            branch_name: "HEAD".into(),
            tag_names: vec!["v1.0.0".into()],
            is_detached_head: true,
            ..VcsSnapshot::default()
        };
        let refs = snapshot.search_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "v1.0.0");
    }

    #[test]
    fn outside_repo_is_not_a_repo() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let git = GitCli::new(&dir).unwrap();
        assert!(!git.is_inside_repo().unwrap());
        assert!(matches!(git.repo_root(), Err(GitError::NotARepo)));
    }

    #[test]
    fn snapshot_of_fresh_repo() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        let git = GitCli::new(&dir).unwrap();
        let snapshot = git.snapshot().unwrap();
        assert_eq!(snapshot.branch_name, "trunk");
        assert_eq!(snapshot.commit_short_hash.len(), 7);
        assert!(snapshot.tag_names.is_empty());
        assert!(!snapshot.is_detached_head);
        assert!(!snapshot.is_dirty);
    }

    #[test]
    fn untracked_file_makes_tree_dirty() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        std::fs::write(dir.join("scratch.txt"), "x").unwrap();
        let git = GitCli::new(&dir).unwrap();
        assert!(git.snapshot().unwrap().is_dirty);
    }

    #[test]
    fn detached_tag_checkout() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        let git = GitCli::new(&dir).unwrap();
        git.create_tag("v1.0.0").unwrap();
        run(&dir, &["checkout", "--quiet", "v1.0.0"]);

        let snapshot = git.snapshot().unwrap();
        assert!(snapshot.is_detached_head);
        assert_eq!(snapshot.branch_name, "HEAD");
        assert_eq!(snapshot.tag_names, vec!["v1.0.0".to_string()]);
    }

    #[test]
    fn create_branch_does_not_switch() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        let git = GitCli::new(&dir).unwrap();
        assert!(!git.branch_exists("release/v1.0.0").unwrap());
        git.create_branch("release/v1.0.0").unwrap();
        assert!(git.branch_exists("release/v1.0.0").unwrap());
        assert_eq!(git.current_branch().unwrap().as_deref(), Some("trunk"));
    }

    #[test]
    fn commit_file_commits_only_that_file() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        std::fs::write(dir.join("version.yml"), "version: '1.0'\n").unwrap();
        std::fs::write(dir.join("other.txt"), "x").unwrap();
        let git = GitCli::new(&dir).unwrap();

        git.commit_file(&dir.join("version.yml"), "bump").unwrap();

        let status = git.git(&["status", "--porcelain"]).unwrap();
        assert!(status.contains("other.txt"));
        assert!(!status.contains("version.yml"));
    }

    #[test]
    fn unborn_head_is_no_commits() {
        if !git_available() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        run(&dir, &["init", "--quiet"]);
        let git = GitCli::new(&dir).unwrap();
        assert!(matches!(git.snapshot(), Err(GitError::NoCommits)));
    }

    #[test]
    fn git_error_on_bad_command() {
        if !git_available() {
            return;
        }
        let (_tmp, dir) = init_repo();
        let git = GitCli::new(&dir).unwrap();
        assert!(matches!(
            git.git(&["not-a-real-subcommand"]),
            Err(GitError::Command { .. })
        ));
    }

    #[test]
    fn static_vcs_records_writes() {
        let vcs = StaticVcs::new("/repo", VcsSnapshot::default()).with_branch("main");
        assert!(vcs.branch_exists("main").unwrap());
        vcs.create_branch("release/v1").unwrap();
        vcs.create_tag("v1").unwrap();
        assert!(vcs.branch_exists("release/v1").unwrap());
        assert!(vcs.tag_exists("v1").unwrap());
        assert_eq!(
            vcs.writes(),
            vec![
                RecordedWrite::Branch("release/v1".into()),
                RecordedWrite::Tag("v1".into())
            ]
        );
    }
}
