//! Branch rule selection.
//!
//! Rules are tried in a fixed order: the release rule under `default`, then
//! every entry of `branches` in document order, then `default` itself. The
//! first rule with a pattern matching any search ref wins.

use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::error::{ResolveError, ResolveResult};
use crate::git::{RefKind, SearchRef, VcsSnapshot};
use crate::version::VersionComponent;
use crate::version_file::{BranchRule, DefaultRule, VersionConfig};

/// Prefix that limits a pattern to tag refs.
const TAG_ONLY_PREFIX: &str = "tag::";

/// Which rule was selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum RuleId {
    /// `default.release`
    Release,
    /// `branches.<name>`
    Branch(String),
    /// `default`
    Default,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => f.write_str("default.release"),
            Self::Branch(name) => write!(f, "branches.{name}"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// A rule with the default rule filling in its blank fields.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveRule<'a> {
    specific: Option<&'a BranchRule>,
    default: &'a DefaultRule,
}

impl<'a> EffectiveRule<'a> {
    /// `specific` overlaid on `default`. `None` yields the default rule.
    pub const fn new(specific: Option<&'a BranchRule>, default: &'a DefaultRule) -> Self {
        Self { specific, default }
    }

    /// Effective `versionSchema`.
    pub fn version_schema(&self) -> Option<&'a str> {
        self.text(|r| r.version_schema.as_deref())
    }

    /// Effective `newBranchSchema`.
    pub fn new_branch_schema(&self) -> Option<&'a str> {
        self.text(|r| r.new_branch_schema.as_deref())
    }

    /// Effective `newTagSchema`.
    pub fn new_tag_schema(&self) -> Option<&'a str> {
        self.text(|r| r.new_tag_schema.as_deref())
    }

    /// Effective `prereleaseTag`, empty when unset everywhere.
    pub fn prerelease_tag(&self) -> &'a str {
        self.text(|r| r.prerelease_tag.as_deref()).unwrap_or("")
    }

    /// Effective `precision`.
    pub fn precision(&self) -> Option<VersionComponent> {
        self.specific
            .and_then(|r| r.precision)
            .or(self.default.rule.precision)
    }

    fn text(&self, field: impl Fn(&'a BranchRule) -> Option<&'a str>) -> Option<&'a str> {
        let present = |s: &&str| !s.trim().is_empty();
        self.specific
            .and_then(&field)
            .filter(present)
            .or_else(|| field(&self.default.rule).filter(present))
    }
}

/// Look up a rule by id, with fallback to `default`.
pub fn effective_rule<'a>(config: &'a VersionConfig, id: &RuleId) -> ResolveResult<EffectiveRule<'a>> {
    let default = config.default.as_ref().ok_or(ResolveError::NoRuleMatched)?;
    let specific = match id {
        RuleId::Release => default.release.as_ref(),
        RuleId::Branch(name) => Some(
            config
                .branches
                .get(name)
                .ok_or_else(|| ResolveError::UnknownBranchKey(name.clone()))?,
        ),
        RuleId::Default => None,
    };
    Ok(EffectiveRule::new(specific, default))
}

/// Pick the rule that applies to `snapshot`.
///
/// Fails only when the document has no `default` rule or a pattern does not
/// compile.
#[instrument(skip_all, fields(branch = %snapshot.branch_name, detached = snapshot.is_detached_head))]
pub fn resolve_active_rule(snapshot: &VcsSnapshot, config: &VersionConfig) -> ResolveResult<RuleId> {
    let default = config.default.as_ref().ok_or(ResolveError::NoRuleMatched)?;
    let refs = snapshot.search_refs();
    trace!(?refs, "search refs");

    if let Some(release) = &default.release
        && rule_matches(&RuleId::Release, release, &refs)?
    {
        debug!(rule = %RuleId::Release, "active rule");
        return Ok(RuleId::Release);
    }

    for (name, rule) in &config.branches {
        let id = RuleId::Branch(name.clone());
        if rule_matches(&id, rule, &refs)? {
            debug!(rule = %id, "active rule");
            return Ok(id);
        }
    }

    debug!(rule = %RuleId::Default, "no rule matched, using default");
    Ok(RuleId::Default)
}

/// Whether any pattern of `rule` finds a match in any eligible ref.
fn rule_matches(id: &RuleId, rule: &BranchRule, refs: &[SearchRef]) -> ResolveResult<bool> {
    for raw in &rule.match_patterns {
        let (tags_only, pattern) = raw
            .strip_prefix(TAG_ONLY_PREFIX)
            .map_or((false, raw.as_str()), |p| (true, p));
        let regex = Regex::new(pattern).map_err(|source| ResolveError::InvalidPattern {
            rule: id.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;

        for candidate in refs {
            if tags_only && candidate.kind != RefKind::Tag {
                continue;
            }
            let matched = regex.is_match(&candidate.name);
            trace!(rule = %id, %pattern, git_ref = %candidate.name, tags_only, matched, "match attempt");
            if matched {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
