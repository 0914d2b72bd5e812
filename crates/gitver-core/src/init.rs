//! Starter `version.yml` templates for `gitver init`.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::version::{VersionError, parse_version};
use crate::version_file::{VersionFile, VersionFileError};

/// Errors from `init`.
#[derive(Error, Debug)]
pub enum InitError {
    /// A version file is already present and `--force` was not given.
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(Utf8PathBuf),

    /// The `inherited` template needs a base document URI.
    #[error("the inherited template needs --inherit-from <URI>")]
    MissingInheritFrom,

    /// The starting version is not valid.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The rendered template failed to load back.
    #[error(transparent)]
    Template(#[from] VersionFileError),

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for `init`.
pub type InitResult<T> = Result<T, InitError>;

/// Which starter document to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InitTemplate {
    /// Default rule and a release rule only.
    LocalMinimal,
    /// Default, release, and development rules.
    #[default]
    LocalDefault,
    /// Everything inherited from a shared base document.
    Inherited,
}

const LOCAL_MINIMAL: &str = r"---
version: '{{version}}'
default:
  versionSchema: '{major}.{minor}.{patch}.{build}[-]{branch}[.]{commitShortHash}'
  precision: build
  prereleaseTag: dev
  release:
    match:
      - ^release/.*
    versionSchema: '{major}.{minor}.{patch}'
";

const LOCAL_DEFAULT: &str = r"---
version: '{{version}}'
default:
  versionSchema: '{major}.{minor}.{patch}[.]{build}[-]{branch}[.]{commitShortHash}'
  newTagSchema: 'v{major}.{minor}.{patch}'
  precision: minor
  prereleaseTag: local
  release:
    match:
      - ^v.*
    newBranchSchema: 'release/v{major}.{minor}.{patch}'
    versionSchema: '{major}.{minor}.{patch}'
branches:
  release:
    match:
      - ^release/.*
    versionSchema: '{major}.{minor}.{patch}-{prereleaseTag}-{commitShortHash}'
    precision: patch
    prereleaseTag: rc
  development:
    match:
      - ^development.*
    versionSchema: '{major}.{minor}.{patch}.{build}-{prereleaseTag}-{commitShortHash}'
    precision: build
    prereleaseTag: dev
";

const INHERITED: &str = r"---
version: '{{version}}'
default:
  inheritFrom: '{{inheritFrom}}'
";

/// Render `template` with the starting `version`.
pub fn render_template(
    template: InitTemplate,
    version: &str,
    inherit_from: Option<&str>,
) -> InitResult<String> {
    let version = parse_version(version)?.to_string();
    let text = match template {
        InitTemplate::LocalMinimal => LOCAL_MINIMAL.replace("{{version}}", &version),
        InitTemplate::LocalDefault => LOCAL_DEFAULT.replace("{{version}}", &version),
        InitTemplate::Inherited => {
            let uri = inherit_from
                .filter(|uri| !uri.trim().is_empty())
                .ok_or(InitError::MissingInheritFrom)?;
            INHERITED
                .replace("{{version}}", &version)
                .replace("{{inheritFrom}}", &uri.replace('\'', "''"))
        }
    };
    Ok(text)
}

/// Write a starter version file named `file_name` into `dir`.
///
/// Local templates are loaded back before writing so a broken template can
/// never land on disk. Inherited templates are only checked as YAML, since
/// a full load would fetch the base document.
#[instrument(fields(dir = %dir))]
pub fn write_version_file(
    dir: &Utf8Path,
    file_name: &str,
    template: InitTemplate,
    version: &str,
    inherit_from: Option<&str>,
    force: bool,
) -> InitResult<Utf8PathBuf> {
    let path = dir.join(file_name);
    if path.exists() && !force {
        return Err(InitError::AlreadyExists(path));
    }

    let text = render_template(template, version, inherit_from)?;
    if template == InitTemplate::Inherited {
        serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(|source| {
            VersionFileError::Parse {
                origin: path.to_string(),
                source,
            }
        })?;
    } else {
        VersionFile::parse(&path, &text)?;
    }

    fs::write(&path, text).map_err(|source| InitError::Write {
        path: path.clone(),
        source,
    })?;
    debug!(%path, ?template, "version file written");
    Ok(path)
}
