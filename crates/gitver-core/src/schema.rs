//! Schema template rendering.
//!
//! A schema is a template such as `{major}.{minor}.{patch}[-]{branch}` that
//! produces a version, branch, or tag name. Rendering happens in three passes:
//!
//! 1. **Placeholders**: the fixed vocabulary (`{major}`, `{minor}`, `{patch}`,
//!    `{build}`, `{branch}`, `{prereleaseTag}`, `{commitShortHash}`) is
//!    substituted first. Any `{NAME}` left afterwards is looked up in the
//!    process environment (empty string when unset).
//! 2. **Delimiter blocks**: a `[...]` block immediately followed by another
//!    `[...]` block is dropped, then a `[...]` block at the very end of the
//!    string is dropped. Remaining `{...}` and `[...]` markers are unwrapped.
//! 3. **Version sanitizing**: for version strings only, `/` becomes `-`
//!    (see [`render_version`]).
//!
//! The delimiter rules are what make `[-]{prereleaseTag}` vanish when there
//! is no prerelease tag.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::trace;

use crate::version::VersionState;

/// Regex for a single `[...]` delimiter block.
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid block regex"));

/// Regex for a `[...]` block anchored at the end of the input.
static END_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]$").expect("valid end block regex"));

/// Regex for any `{...}` or `[...]` marker whose content should be kept.
static BLOCK_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^\}]*)\}|\[([^\]]*)\]").expect("valid block content regex")
});

/// Regex for a leftover `{NAME}` placeholder (environment lookup).
static ENV_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}\[\]]*)\}").expect("valid placeholder regex"));

/// Regex for the leading numeric run of a rendered version.
static NUMERIC_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+){1,3}").expect("valid numeric regex"));

/// Errors from schema rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The rendered version does not start with a dotted numeric sequence.
    #[error("could not extract a numeric version from '{0}'")]
    NumericExtractionFailed(String),
}

/// Values available to a schema during rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Version components.
    pub version: &'a VersionState,
    /// Current branch name.
    pub branch: &'a str,
    /// Prerelease tag of the active rule (may be empty).
    pub prerelease_tag: &'a str,
    /// Short commit hash, or the dirty-repo placeholder.
    pub commit_short_hash: &'a str,
}

/// Render a schema using the fixed placeholders, environment lookups, and
/// delimiter-block resolution.
///
/// Slashes are kept, so branch schemas like `release/v{major}.{minor}` stay
/// valid git ref names.
pub fn render(schema: &str, ctx: &RenderContext<'_>) -> String {
    let v = ctx.version;
    let substituted = schema
        .replace("{major}", &v.major.to_string())
        .replace("{minor}", &v.minor.to_string())
        .replace("{patch}", &optional_component(v.patch))
        .replace("{build}", &optional_component(v.build))
        .replace("{branch}", ctx.branch)
        .replace("{prereleaseTag}", ctx.prerelease_tag)
        .replace("{commitShortHash}", ctx.commit_short_hash);
    trace!(%schema, %substituted, "substituted fixed placeholders");

    let with_env = resolve_environment_variables(&substituted);
    let resolved = resolve_delimiter_blocks(&with_env);
    trace!(%resolved, "resolved delimiter blocks");
    resolved
}

/// Render a version schema. Same as [`render`], with `/` replaced by `-` so
/// branch names like `feature/login` cannot leak path separators into the
/// version string.
pub fn render_version(schema: &str, ctx: &RenderContext<'_>) -> String {
    render(schema, ctx).replace('/', "-")
}

/// Substitute every remaining `{NAME}` with the environment variable `NAME`.
///
/// Missing variables resolve to an empty string so the delimiter rules can
/// drop the surrounding block.
pub fn resolve_environment_variables(input: &str) -> String {
    ENV_PLACEHOLDER_RE
        .replace_all(input, |caps: &Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) if !value.is_empty() => value,
                _ => {
                    trace!(variable = name, "environment variable not set, using empty string");
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Collapse adjacent delimiter blocks, drop a trailing block, and unwrap the
/// remaining `{...}` / `[...]` markers.
///
/// Running this on its own output is a no-op for any input without nested
/// brackets.
pub fn resolve_delimiter_blocks(input: &str) -> String {
    let collapsed = drop_blocks_followed_by_blocks(input);
    let trimmed = END_BLOCK_RE.replace(&collapsed, "");
    BLOCK_CONTENT_RE
        .replace_all(&trimmed, |caps: &Captures<'_>| {
            let curly = caps.get(1).map_or("", |m| m.as_str());
            let square = caps.get(2).map_or("", |m| m.as_str());
            format!("{curly}{square}")
        })
        .into_owned()
}

/// Remove every `[...]` block that is immediately followed by another one.
///
/// The last block of a run survives, e.g. `a[-][.]b` becomes `a[.]b`.
fn drop_blocks_followed_by_blocks(input: &str) -> String {
    let blocks: Vec<_> = BLOCK_RE.find_iter(input).collect();
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;

    for (i, block) in blocks.iter().enumerate() {
        let followed_by_block = blocks
            .get(i + 1)
            .is_some_and(|next| next.start() == block.end());
        if followed_by_block {
            out.push_str(&input[cursor..block.start()]);
            cursor = block.end();
        }
    }
    out.push_str(&input[cursor..]);
    out
}

/// Extract the leading `major.minor[.patch[.build]]` run of a rendered version.
pub fn extract_numeric(rendered: &str) -> Result<String, SchemaError> {
    NUMERIC_VERSION_RE
        .find(rendered)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SchemaError::NumericExtractionFailed(rendered.to_string()))
}

/// Unset components render as an empty string, which lets `[.]{build}` drop
/// out cleanly when the build number is not tracked.
fn optional_component(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
