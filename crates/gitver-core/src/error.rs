//! Error types for gitver-core

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::git::GitError;
use crate::locate::LocateError;
use crate::schema::SchemaError;
use crate::version::VersionError;
use crate::version_file::VersionFileError;

/// Errors that can occur when working with tool settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which schema field of a rule an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaField {
    /// `versionSchema`
    Version,
    /// `newBranchSchema`
    NewBranch,
    /// `newTagSchema`
    NewTag,
}

impl std::fmt::Display for SchemaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Version => "versionSchema",
            Self::NewBranch => "newBranchSchema",
            Self::NewTag => "newTagSchema",
        })
    }
}

/// Errors surfaced by version resolution and the operations built on it.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The working directory is not inside a git repository.
    #[error("no git repository found from {0}")]
    NoRepositoryFound(Utf8PathBuf),

    /// No usable version file between the working directory and the
    /// repository root.
    #[error(transparent)]
    NoConfigFileFound(#[from] LocateError),

    /// The version file (or its inherited base) could not be read or parsed.
    #[error(transparent)]
    InvalidConfig(#[from] VersionFileError),

    /// The version file has no `default` rule to fall back to.
    #[error("no branch rule could be determined: the version file has no 'default' rule")]
    NoRuleMatched,

    /// The rule chosen for an operation has no schema for it.
    #[error("no {field} configured for rule '{rule}'")]
    NoSchemaConfigured {
        /// Rule the schema was looked up on.
        rule: String,
        /// Missing field.
        field: SchemaField,
    },

    /// `create branch KEY` named a rule that is not under `branches`.
    #[error("no branch rule named '{0}' in the version file")]
    UnknownBranchKey(String),

    /// A version string or bump component was rejected.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The rendered version has no leading numeric run.
    #[error(transparent)]
    NumericExtractionFailed(#[from] SchemaError),

    /// A `match` entry is not a valid regular expression.
    #[error("invalid match pattern '{pattern}' in rule '{rule}': {source}")]
    InvalidPattern {
        /// Rule holding the pattern.
        rule: String,
        /// Offending pattern, without any `tag::` prefix.
        pattern: String,
        /// Regex compile error.
        source: regex::Error,
    },

    /// A branch or tag about to be created already exists.
    #[error("{kind} '{name}' already exists")]
    RefExists {
        /// `branch` or `tag`.
        kind: &'static str,
        /// Ref name.
        name: String,
    },

    /// Git failed while reading state or writing refs.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl ResolveError {
    pub(crate) fn no_schema(rule: impl Into<String>, field: SchemaField) -> Self {
        Self::NoSchemaConfigured {
            rule: rule.into(),
            field,
        }
    }
}

/// Result alias for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
