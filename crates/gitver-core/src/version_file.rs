//! The `version.yml` document: model, loading, inheritance, and persistence.
//!
//! ```yaml
//! version: '1.0.0'
//! default:
//!   versionSchema: '{major}.{minor}.{patch}[-]{branch}[.]{commitShortHash}'
//!   precision: minor
//!   release:
//!     match: ['^v.*']
//!     newBranchSchema: 'release/v{major}.{minor}.{patch}'
//! branches:
//!   release:
//!     match: ['^release/v.*']
//!     versionSchema: '{major}.{minor}.{patch}-{prereleaseTag}-{commitShortHash}'
//!     prereleaseTag: rc
//! ```
//!
//! `default.inheritFrom` names a base document (http(s) URL, `file://` URL,
//! or a path relative to the version file). The base is merged under the
//! local document before deserializing: mappings merge recursively, lists
//! and scalars from the local document replace the base's, and a local
//! `null` leaves the inherited value in place. Only one level is followed.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::version::{VersionComponent, VersionError, VersionState};

/// File name searched for when no other name is configured.
pub const DEFAULT_VERSION_FILE_NAME: &str = "version.yml";

/// Commit hash stand-in used for dirty working trees.
pub const DEFAULT_DIRTY_REPO_PLACEHOLDER: &str = "dirty-repo";

/// Errors from reading or writing a version file.
#[derive(Error, Debug)]
pub enum VersionFileError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the expected shape.
    #[error("invalid version file {origin}: {source}")]
    Parse {
        /// Path or URI of the document.
        origin: String,
        /// YAML error.
        source: serde_yaml::Error,
    },

    /// The document root is not a mapping.
    #[error("invalid version file {0}: expected a mapping at the top level")]
    NotAMapping(String),

    /// An inherited document could not be fetched over HTTP.
    #[error("failed to fetch inherited version file {uri}: {source}")]
    Fetch {
        /// URL that failed.
        uri: String,
        /// HTTP client error.
        source: reqwest::Error,
    },

    /// The `version` key does not hold a valid version.
    #[error("invalid version in {path}: {source}")]
    InvalidVersion {
        /// Version file.
        path: Utf8PathBuf,
        /// Validation failure.
        source: VersionError,
    },

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for version file operations.
pub type VersionFileResult<T> = Result<T, VersionFileError>;

/// One entry of the rule set. Empty fields fall back to the default rule.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BranchRule {
    /// Regexes tried against refs; a `tag::` prefix limits a pattern to tags.
    #[serde(
        rename = "match",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub match_patterns: Vec<String>,
    /// Template for the version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_schema: Option<String>,
    /// Template for branches created from this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_branch_schema: Option<String>,
    /// Template for tags created from this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_tag_schema: Option<String>,
    /// Component bumped when a release is cut from this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<VersionComponent>,
    /// Value of `{prereleaseTag}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease_tag: Option<String>,
}

/// The `default` rule: a [`BranchRule`] plus file-wide settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRule {
    /// Fallback values for every other rule.
    #[serde(flatten)]
    pub rule: BranchRule,
    /// Base document merged under this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_from: Option<String>,
    /// Commit hash stand-in for dirty working trees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty_repo: Option<String>,
    /// Highest-priority rule, usually matching release tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<BranchRule>,
}

impl DefaultRule {
    /// Placeholder substituted for the commit hash when the tree is dirty.
    pub fn dirty_repo_placeholder(&self) -> &str {
        self.dirty_repo
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_DIRTY_REPO_PLACEHOLDER)
    }
}

/// Root of a `version.yml` document.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionConfig {
    /// Dotted version string (2 to 4 components).
    #[serde(deserialize_with = "version_string")]
    pub version: String,
    /// Fallback rule, release rule, and file-wide settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultRule>,
    /// Named rules, tried in document order.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub branches: IndexMap<String, BranchRule>,
}

/// A loaded version file.
#[derive(Debug, Clone)]
pub struct VersionFile {
    path: Utf8PathBuf,
    config: VersionConfig,
    version: VersionState,
}

impl VersionFile {
    /// Read, resolve inheritance, and validate the version file at `path`.
    #[instrument(fields(path = %path))]
    pub fn load(path: &Utf8Path) -> VersionFileResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| VersionFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Build a version file from `text` as if it had been read from `path`.
    ///
    /// Relative `inheritFrom` paths resolve against `path`'s directory.
    pub fn parse(path: &Utf8Path, text: &str) -> VersionFileResult<Self> {
        let mut local = parse_document(path.as_str(), text)?;
        keep_version_text(&mut local, text);
        let document = match inherit_from(&local) {
            Some(uri) => {
                debug!(%uri, "merging inherited version file");
                let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
                let base_text = fetch_inherited(&uri, base_dir)?;
                let mut base = parse_document(&uri, &base_text)?;
                keep_version_text(&mut base, &base_text);
                merge_documents(base, local)
            }
            None => local,
        };

        let config: VersionConfig =
            serde_yaml::from_value(document).map_err(|source| VersionFileError::Parse {
                origin: path.to_string(),
                source,
            })?;
        let version = config
            .version
            .parse::<VersionState>()
            .map_err(|source| VersionFileError::InvalidVersion {
                path: path.to_path_buf(),
                source,
            })?;
        trace!(?config, "version file loaded");

        Ok(Self {
            path: path.to_path_buf(),
            config,
            version,
        })
    }

    /// Location on disk.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The merged document.
    pub const fn config(&self) -> &VersionConfig {
        &self.config
    }

    /// The parsed `version` value.
    pub const fn version(&self) -> VersionState {
        self.version
    }

    /// Write `version` to the file's `version` key.
    ///
    /// Only the local file is touched; inherited settings are never inlined.
    /// A plain `version: ...` line is rewritten in place so comments and
    /// formatting survive. Anything fancier is round-tripped through YAML.
    #[instrument(skip(self), fields(path = %self.path, %version))]
    pub fn persist_version(&mut self, version: VersionState) -> VersionFileResult<()> {
        let rendered = version.to_string();
        let text = fs::read_to_string(&self.path).map_err(|source| VersionFileError::Read {
            path: self.path.clone(),
            source,
        })?;

        let updated = match replace_version_line(&text, &rendered) {
            Some(updated) => updated,
            None => {
                debug!("no plain version line, re-serializing document");
                let mut document = parse_document(self.path.as_str(), &text)?;
                if let Value::Mapping(map) = &mut document {
                    map.insert(Value::from("version"), Value::from(rendered.as_str()));
                }
                serde_yaml::to_string(&document).map_err(|source| VersionFileError::Parse {
                    origin: self.path.to_string(),
                    source,
                })?
            }
        };

        fs::write(&self.path, updated).map_err(|source| VersionFileError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.config.version = rendered;
        self.version = version;
        debug!("version persisted");
        Ok(())
    }
}

/// Recursively merge `overlay` onto `base`.
///
/// Mappings merge key by key; every other overlay value replaces the base
/// value, except `null`, which keeps it.
pub fn merge_documents(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                if let Some(existing) = base.get_mut(&key) {
                    let current = std::mem::replace(existing, Value::Null);
                    *existing = merge_documents(current, value);
                } else {
                    base.insert(key, value);
                }
            }
            Value::Mapping(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

fn parse_document(origin: &str, text: &str) -> VersionFileResult<Value> {
    let value: Value = serde_yaml::from_str(text).map_err(|source| VersionFileError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    if value.is_mapping() {
        Ok(value)
    } else {
        Err(VersionFileError::NotAMapping(origin.to_string()))
    }
}

fn inherit_from(document: &Value) -> Option<String> {
    document
        .get("default")?
        .get("inheritFrom")?
        .as_str()
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
}

/// Replace a numeric `version` with the scalar exactly as written.
///
/// YAML reads `version: 1.10` as the float `1.1`; the line text keeps the
/// intended components.
fn keep_version_text(document: &mut Value, text: &str) {
    let Value::Mapping(map) = document else {
        return;
    };
    let Some(version) = map.get_mut("version") else {
        return;
    };
    if version.is_number()
        && let Some(raw) = version_line_scalar(text)
    {
        trace!(raw, "numeric version read from its source text");
        *version = Value::from(raw);
    }
}

/// The plain scalar on the first top-level `version:` line, comments removed.
fn version_line_scalar(text: &str) -> Option<&str> {
    let rest = text
        .lines()
        .find_map(|line| line.strip_prefix("version:"))?;
    let value = rest.split(" #").next().unwrap_or(rest).trim();
    (!value.is_empty()).then_some(value)
}

/// Fetch the text of an inherited document.
fn fetch_inherited(uri: &str, base_dir: &Utf8Path) -> VersionFileResult<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        let fetch_err = |source: reqwest::Error| VersionFileError::Fetch {
            uri: uri.to_string(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("gitver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(fetch_err)?;
        let response = client
            .get(uri)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(fetch_err)?;
        return response.text().map_err(fetch_err);
    }

    let local = uri.strip_prefix("file://").unwrap_or(uri);
    let path = base_dir.join(local);
    debug!(%path, "reading inherited version file");
    fs::read_to_string(&path).map_err(|source| VersionFileError::Read { path, source })
}

/// Rewrite the first top-level `version: <scalar>` line.
fn replace_version_line(text: &str, version: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut replaced = false;

    for line in text.split_inclusive('\n') {
        if !replaced && let Some(rest) = line.strip_prefix("version:") {
            let value = rest.trim();
            if value.is_empty() || value.starts_with(['#', '|', '>', '&', '*', '!']) {
                return None;
            }
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            out.push_str(&format!("version: '{version}'{ending}"));
            replaced = true;
        } else {
            out.push_str(line);
        }
    }

    replaced.then_some(out)
}

/// Numbers only reach here when their source text was not recoverable.
fn version_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Err(de::Error::custom(format!(
            "version {n} was read as a number, quote it (version: '{n}')"
        ))),
        other => Err(de::Error::custom(format!(
            "expected a version string, found {other:?}"
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
