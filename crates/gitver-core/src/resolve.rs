//! Version resolution: from working directory to rendered version.
//!
//! [`VersionInfo::resolve`] finds the repository root, locates and loads the
//! version file, snapshots the repository, and picks the active rule. The
//! resulting [`VersionInfo`] renders versions, branch names, and tag names,
//! and persists set/bump operations back to the version file.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::{ResolveError, ResolveResult, SchemaField};
use crate::git::{GitError, SearchRef, VcsProvider, VcsSnapshot};
use crate::locate::find_version_file;
use crate::rules::{EffectiveRule, RuleId, effective_rule, resolve_active_rule};
use crate::schema::{self, RenderContext};
use crate::version::{VersionComponent, VersionState, parse_version};
use crate::version_file::{DEFAULT_VERSION_FILE_NAME, VersionFile};

/// Knobs for [`VersionInfo::resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Use the real commit hash even when the working tree is dirty.
    pub allow_dirty: bool,
    /// Version file name to search for.
    pub version_file_name: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            allow_dirty: false,
            version_file_name: DEFAULT_VERSION_FILE_NAME.to_string(),
        }
    }
}

/// Resolved version state for one invocation.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    file: VersionFile,
    snapshot: VcsSnapshot,
    commit_hash: String,
    active: RuleId,
    last_rendered: Option<String>,
}

/// Everything `get --json`, `get --debug`, and `info` report.
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    /// Rendered version.
    pub version: String,
    /// Leading numeric run of the version, if it has one.
    pub numeric_version: Option<String>,
    /// Whether the rendered version is a valid SemVer 2.0 string.
    pub semver: bool,
    /// Version components from the version file.
    pub components: VersionState,
    /// Version file in use.
    pub version_file: Utf8PathBuf,
    /// Active rule.
    pub rule: String,
    /// Effective prerelease tag.
    pub prerelease_tag: String,
    /// Branch name (`HEAD` when detached).
    pub branch: String,
    /// Tags at `HEAD`.
    pub tags: Vec<String>,
    /// Commit hash used for rendering (the placeholder when dirty).
    pub commit_short_hash: String,
    /// Working tree has changes.
    pub dirty: bool,
    /// `HEAD` is detached.
    pub detached: bool,
    /// Refs tried against rule patterns.
    pub search_refs: Vec<SearchRef>,
}

impl VersionInfo {
    /// Resolve version state for `start_dir`.
    #[instrument(skip(vcs, options), fields(start_dir = %start_dir, allow_dirty = options.allow_dirty))]
    pub fn resolve(
        vcs: &dyn VcsProvider,
        start_dir: &Utf8Path,
        options: &ResolveOptions,
    ) -> ResolveResult<Self> {
        let root = vcs.repo_root().map_err(|e| match e {
            GitError::NotARepo => ResolveError::NoRepositoryFound(start_dir.to_path_buf()),
            other => other.into(),
        })?;
        let path = find_version_file(start_dir, &root, &options.version_file_name)?;
        let file = VersionFile::load(&path)?;
        let snapshot = vcs.snapshot()?;
        Self::from_parts(file, snapshot, options.allow_dirty)
    }

    /// Resolve from an already loaded file and snapshot.
    pub fn from_parts(
        file: VersionFile,
        snapshot: VcsSnapshot,
        allow_dirty: bool,
    ) -> ResolveResult<Self> {
        let default = file
            .config()
            .default
            .as_ref()
            .ok_or(ResolveError::NoRuleMatched)?;

        let commit_hash = if snapshot.is_dirty && !allow_dirty {
            let placeholder = default.dirty_repo_placeholder();
            warn!(%placeholder, "working tree is dirty, substituting commit hash");
            placeholder.to_string()
        } else {
            snapshot.commit_short_hash.clone()
        };

        let active = resolve_active_rule(&snapshot, file.config())?;
        debug!(rule = %active, %commit_hash, version = %file.version(), "version resolved");

        Ok(Self {
            file,
            snapshot,
            commit_hash,
            active,
            last_rendered: None,
        })
    }

    /// The loaded version file.
    pub const fn file(&self) -> &VersionFile {
        &self.file
    }

    /// Repository snapshot taken during resolution.
    pub const fn snapshot(&self) -> &VcsSnapshot {
        &self.snapshot
    }

    /// Current version components.
    pub const fn version_state(&self) -> VersionState {
        self.file.version()
    }

    /// Commit hash used for rendering; the dirty placeholder when the tree
    /// is dirty and dirt was not allowed.
    pub fn commit_hash(&self) -> &str {
        &self.commit_hash
    }

    /// Whether the commit hash was replaced by the dirty placeholder.
    pub fn is_dirty_substituted(&self) -> bool {
        self.commit_hash != self.snapshot.commit_short_hash
    }

    /// Identifier of the active rule.
    pub const fn active_rule_id(&self) -> &RuleId {
        &self.active
    }

    /// The active rule with default fallbacks applied.
    pub fn active_rule(&self) -> ResolveResult<EffectiveRule<'_>> {
        effective_rule(self.file.config(), &self.active)
    }

    /// Render the version with the active rule's `versionSchema`.
    pub fn version(&mut self) -> ResolveResult<String> {
        self.version_with_schema(None)
    }

    /// Render the version with `schema`, or the active rule's schema when
    /// `None`. The result is remembered for [`Self::numeric_version`].
    #[instrument(skip(self))]
    pub fn version_with_schema(&mut self, schema: Option<&str>) -> ResolveResult<String> {
        let rendered = match schema {
            Some(schema) => {
                let rule = self.active_rule()?;
                self.render_version_with(schema, &self.version_state(), rule.prerelease_tag())
            }
            None => self.render_version_for(&self.version_state())?,
        };
        debug!(%rendered, "version rendered");
        self.last_rendered = Some(rendered.clone());
        Ok(rendered)
    }

    /// Leading `major.minor[.patch[.build]]` of the last rendered version.
    pub fn numeric_version(&mut self) -> ResolveResult<String> {
        let rendered = match &self.last_rendered {
            Some(rendered) => rendered.clone(),
            None => self.version()?,
        };
        Ok(schema::extract_numeric(&rendered)?)
    }

    /// Render `state` with the active rule's `versionSchema` without
    /// touching the cache.
    pub fn render_version_for(&self, state: &VersionState) -> ResolveResult<String> {
        let rule = self.active_rule()?;
        let schema = rule
            .version_schema()
            .ok_or_else(|| ResolveError::no_schema(self.active.to_string(), SchemaField::Version))?;
        debug!(%schema, rule = %self.active, "using version schema");
        Ok(self.render_version_with(schema, state, rule.prerelease_tag()))
    }

    /// Validate `new_version` (when given), store it, and write the version
    /// file. `None` writes the current in-memory state.
    #[instrument(skip(self))]
    pub fn set_version(&mut self, new_version: Option<&str>) -> ResolveResult<()> {
        let state = match new_version {
            Some(raw) => parse_version(raw)?,
            None => self.version_state(),
        };
        self.file.persist_version(state)?;
        self.last_rendered = None;
        Ok(())
    }

    /// Bump `component` and persist.
    #[instrument(skip(self))]
    pub fn bump_version(&mut self, component: VersionComponent) -> ResolveResult<()> {
        let next = self.version_state().bumped(component);
        debug!(previous = %self.version_state(), %next, "bumping version");
        self.file.persist_version(next)?;
        self.last_rendered = None;
        Ok(())
    }

    /// Render `newBranchSchema` of the release rule (`release`) or the active
    /// rule.
    pub fn new_branch_name(&self, release: bool) -> ResolveResult<String> {
        let id = if release { RuleId::Release } else { self.active.clone() };
        self.render_ref_name(&id, SchemaField::NewBranch)
    }

    /// Render `newBranchSchema` of `branches[key]`, bypassing matching.
    pub fn new_branch_name_from_key(&self, key: &str) -> ResolveResult<String> {
        self.render_ref_name(&RuleId::Branch(key.to_string()), SchemaField::NewBranch)
    }

    /// Render `newTagSchema` of the release rule (`release`) or the active
    /// rule.
    pub fn new_tag_name(&self, release: bool) -> ResolveResult<String> {
        let id = if release { RuleId::Release } else { self.active.clone() };
        self.render_ref_name(&id, SchemaField::NewTag)
    }

    /// Collect the diagnostic view of this resolution.
    pub fn summary(&mut self, schema: Option<&str>) -> ResolveResult<VersionSummary> {
        let version = self.version_with_schema(schema)?;
        let numeric_version = schema::extract_numeric(&version).ok();
        let prerelease_tag = self.active_rule()?.prerelease_tag().to_string();
        Ok(VersionSummary {
            semver: semver::Version::parse(&version).is_ok(),
            version,
            numeric_version,
            components: self.version_state(),
            version_file: self.file.path().to_path_buf(),
            rule: self.active.to_string(),
            prerelease_tag,
            branch: self.snapshot.branch_name.clone(),
            tags: self.snapshot.tag_names.clone(),
            commit_short_hash: self.commit_hash.clone(),
            dirty: self.snapshot.is_dirty,
            detached: self.snapshot.is_detached_head,
            search_refs: self.snapshot.search_refs(),
        })
    }

    #[instrument(skip(self))]
    fn render_ref_name(&self, id: &RuleId, field: SchemaField) -> ResolveResult<String> {
        let rule = effective_rule(self.file.config(), id)?;
        let schema = match field {
            SchemaField::NewBranch => rule.new_branch_schema(),
            SchemaField::NewTag => rule.new_tag_schema(),
            SchemaField::Version => rule.version_schema(),
        }
        .ok_or_else(|| ResolveError::no_schema(id.to_string(), field))?;

        let state = self.version_state();
        let name = schema::render(schema, &self.context(&state, rule.prerelease_tag()));
        debug!(%schema, %name, "ref name rendered");
        Ok(name)
    }

    fn render_version_with(&self, schema: &str, state: &VersionState, prerelease_tag: &str) -> String {
        schema::render_version(schema, &self.context(state, prerelease_tag))
    }

    /// `{branch}` is empty when detached so `[-]{branch}` drops out.
    fn context<'a>(&'a self, state: &'a VersionState, prerelease_tag: &'a str) -> RenderContext<'a> {
        let branch = if self.snapshot.is_detached_head {
            ""
        } else {
            self.snapshot.branch_name.as_str()
        };
        RenderContext {
            version: state,
            branch,
            prerelease_tag,
            commit_short_hash: &self.commit_hash,
        }
    }
}
