//! Release branch planning and execution.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Two-phase workflow
//!
//! 1. **Plan** ([`plan_release`]) renders the release branch name, the
//!    current numeric version, and the numeric version after bumping by the
//!    active rule's precision. Nothing is written, so any failure leaves the
//!    repository untouched.
//! 2. **Execute** ([`ReleasePlan::execute`]) creates the branch at `HEAD`
//!    without checking it out, persists the bumped version on the current
//!    branch, and optionally commits the version file.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{ResolveError, ResolveResult};
use crate::git::VcsProvider;
use crate::resolve::VersionInfo;
use crate::schema;
use crate::version::{VersionComponent, VersionState};

/// Commit message used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "gitver: Set version {oldVersion} => {newVersion}";

/// A validated release, ready to execute.
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    /// Branch to create at `HEAD`.
    pub branch_name: String,
    /// Component bumped on the current branch.
    pub precision: VersionComponent,
    /// Version before the bump.
    pub previous: VersionState,
    /// Version after the bump.
    pub next: VersionState,
    /// Numeric form of `previous` as rendered by the active rule.
    pub previous_numeric: String,
    /// Numeric form of `next` as rendered by the active rule.
    pub next_numeric: String,
    /// Commit message, when the version file should be committed.
    pub commit_message: Option<String>,
}

/// What [`ReleasePlan::execute`] did.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    /// Branch created.
    pub branch_name: String,
    /// Numeric version before.
    pub previous: String,
    /// Numeric version after.
    pub new: String,
    /// Whether the version file was committed.
    pub committed: bool,
}

/// Validate everything a release needs before anything is written.
///
/// `commit_template` enables the commit step; `{oldVersion}` and
/// `{newVersion}` are replaced with the numeric versions.
#[instrument(skip(info, vcs))]
pub fn plan_release(
    info: &VersionInfo,
    vcs: &dyn VcsProvider,
    commit_template: Option<&str>,
) -> ResolveResult<ReleasePlan> {
    let branch_name = info.new_branch_name(true)?;
    if vcs.branch_exists(&branch_name)? {
        return Err(ResolveError::RefExists {
            kind: "branch",
            name: branch_name,
        });
    }

    let previous = info.version_state();
    let precision = info.active_rule()?.precision().unwrap_or_else(|| {
        let fallback = previous.precision();
        debug!(%fallback, "no precision configured, using the version's own");
        fallback
    });
    let next = previous.bumped(precision);

    let previous_numeric = schema::extract_numeric(&info.render_version_for(&previous)?)?;
    let next_numeric = schema::extract_numeric(&info.render_version_for(&next)?)?;
    let commit_message =
        commit_template.map(|t| render_commit_message(t, &previous_numeric, &next_numeric));

    debug!(%branch_name, %precision, %previous_numeric, %next_numeric, "release planned");
    Ok(ReleasePlan {
        branch_name,
        precision,
        previous,
        next,
        previous_numeric,
        next_numeric,
        commit_message,
    })
}

/// Fill `{oldVersion}` and `{newVersion}` in a commit message template.
pub fn render_commit_message(template: &str, old: &str, new: &str) -> String {
    template
        .replace("{oldVersion}", old)
        .replace("{newVersion}", new)
}

impl ReleasePlan {
    /// Create the branch, persist the bump, and commit if planned.
    #[instrument(skip(self, info, vcs), fields(branch = %self.branch_name))]
    pub fn execute(
        &self,
        info: &mut VersionInfo,
        vcs: &dyn VcsProvider,
    ) -> ResolveResult<ReleaseOutcome> {
        vcs.create_branch(&self.branch_name)?;
        info.bump_version(self.precision)?;

        let committed = match &self.commit_message {
            Some(message) => {
                vcs.commit_file(info.file().path(), message)?;
                true
            }
            None => false,
        };

        info!(
            branch = %self.branch_name,
            previous = %self.previous_numeric,
            new = %self.next_numeric,
            committed,
            "release branch created"
        );
        Ok(ReleaseOutcome {
            branch_name: self.branch_name.clone(),
            previous: self.previous_numeric.clone(),
            new: self.next_numeric.clone(),
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{RecordedWrite, StaticVcs, VcsSnapshot};
    use crate::resolve::ResolveOptions;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    const FIXTURE: &str = r"version: '1.0.0'
default:
  versionSchema: '{major}.{minor}.{patch}[-]{branch}[.]{commitShortHash}'
  precision: minor
  release:
    match: ['^v.*']
    newBranchSchema: release/v{major}.{minor}.{patch}
    versionSchema: '{major}.{minor}.{patch}'
";

    fn setup(text: &str) -> (TempDir, Utf8PathBuf, StaticVcs) {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf())
            .unwrap()
            .canonicalize_utf8()
            .unwrap();
        fs::write(root.join("version.yml"), text).unwrap();
        let vcs = StaticVcs::new(
            root.clone(),
            VcsSnapshot {
                branch_name: "trunk".into(),
                commit_short_hash: "abc1234".into(),
                ..VcsSnapshot::default()
            },
        );
        (tmp, root, vcs)
    }

    #[test]
    fn release_creates_branch_and_bumps_by_precision() {
        let (_tmp, root, vcs) = setup(FIXTURE);
        let mut info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();

        let plan = plan_release(&info, &vcs, None).unwrap();
        assert_eq!(plan.branch_name, "release/v1.0.0");
        assert_eq!(plan.precision, VersionComponent::Minor);
        assert_eq!(plan.previous_numeric, "1.0.0");
        assert_eq!(plan.next_numeric, "1.1.0");

        let outcome = plan.execute(&mut info, &vcs).unwrap();
        assert!(!outcome.committed);
        assert_eq!(vcs.writes(), vec![RecordedWrite::Branch("release/v1.0.0".into())]);
        assert_eq!(info.version_state(), VersionState::new(1, 1, Some(0), None));
        let on_disk = fs::read_to_string(root.join("version.yml")).unwrap();
        assert!(on_disk.starts_with("version: '1.1.0'"));
    }

    #[test]
    fn release_commit_uses_template() {
        let (_tmp, root, vcs) = setup(FIXTURE);
        let mut info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();

        let plan = plan_release(&info, &vcs, Some(DEFAULT_COMMIT_MESSAGE)).unwrap();
        plan.execute(&mut info, &vcs).unwrap();

        assert_eq!(
            vcs.writes()[1],
            RecordedWrite::Commit {
                path: root.join("version.yml"),
                message: "gitver: Set version 1.0.0 => 1.1.0".into(),
            }
        );
    }

    #[test]
    fn existing_branch_fails_before_any_write() {
        let (_tmp, root, vcs) = setup(FIXTURE);
        let vcs = vcs.with_branch("release/v1.0.0");
        let info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();

        let err = plan_release(&info, &vcs, None).unwrap_err();
        assert!(matches!(err, ResolveError::RefExists { kind: "branch", .. }));
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn missing_release_branch_schema_fails_before_any_write() {
        let (_tmp, root, vcs) = setup(
            "version: '1.0.0'\ndefault:\n  versionSchema: '{major}.{minor}.{patch}'\n",
        );
        let info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();

        assert!(matches!(
            plan_release(&info, &vcs, None),
            Err(ResolveError::NoSchemaConfigured { .. })
        ));
        assert!(vcs.writes().is_empty());
        let on_disk = fs::read_to_string(root.join("version.yml")).unwrap();
        assert!(on_disk.starts_with("version: '1.0.0'"));
    }

    #[test]
    fn non_numeric_version_schema_fails_before_any_write() {
        let (_tmp, root, vcs) = setup(
            "version: '1.0.0'\ndefault:\n  versionSchema: 'v{major}.{minor}'\n  newBranchSchema: 'release/{major}.{minor}'\n",
        );
        let info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();

        assert!(matches!(
            plan_release(&info, &vcs, Some(DEFAULT_COMMIT_MESSAGE)),
            Err(ResolveError::NumericExtractionFailed(_))
        ));
        assert!(vcs.writes().is_empty());
    }

    #[test]
    fn precision_falls_back_to_tracked_components() {
        let (_tmp, root, vcs) = setup(
            "version: '1.0.0.4'\ndefault:\n  versionSchema: '{major}.{minor}.{patch}.{build}'\n  newBranchSchema: 'release/{major}.{minor}'\n",
        );
        let info = VersionInfo::resolve(&vcs, &root, &ResolveOptions::default()).unwrap();
        let plan = plan_release(&info, &vcs, None).unwrap();
        assert_eq!(plan.precision, VersionComponent::Build);
        assert_eq!(plan.next_numeric, "1.0.0.5");
    }

    #[test]
    fn commit_message_placeholders() {
        assert_eq!(
            render_commit_message("bump {oldVersion} -> {newVersion}", "1.0", "1.1"),
            "bump 1.0 -> 1.1"
        );
    }
}
