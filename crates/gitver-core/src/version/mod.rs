//! Version state: numeric components and the bump/set rules.
//!
//! A version always tracks `major` and `minor`; `patch` and `build` are
//! optional and give the variable precision `major.minor`,
//! `major.minor.patch`, or `major.minor.patch.build`.

pub mod explicit;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use explicit::parse_version;

/// Errors from version operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// A user-supplied version string failed validation.
    #[error("{0} is not a valid version!")]
    InvalidVersionFormat(String),

    /// A bump target is not one of `major`, `minor`, `patch`, `build`.
    #[error("invalid version component '{0}' (expected major, minor, patch, or build)")]
    InvalidVersionComponent(String),
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// One component of a version, also used as a rule's precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionComponent {
    /// `X.y.z.b`
    Major,
    /// `x.Y.z.b`
    Minor,
    /// `x.y.Z.b`
    Patch,
    /// `x.y.z.B`
    Build,
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Build => write!(f, "build"),
        }
    }
}

impl FromStr for VersionComponent {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "build" => Ok(Self::Build),
            _ => Err(VersionError::InvalidVersionComponent(s.to_string())),
        }
    }
}

/// Numeric version components. `None` means the component is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VersionState {
    /// Major component (always set).
    pub major: u64,
    /// Minor component (always set).
    pub minor: u64,
    /// Patch component, if tracked.
    pub patch: Option<u64>,
    /// Build component, if tracked.
    pub build: Option<u64>,
}

impl VersionState {
    /// Create a version from its components.
    pub const fn new(major: u64, minor: u64, patch: Option<u64>, build: Option<u64>) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Increment `component`.
    ///
    /// Finer components that are tracked reset to 0; untracked ones stay
    /// untracked. Coarser components are untouched. Bumping an untracked
    /// component starts tracking it at 0.
    pub fn bump(&mut self, component: VersionComponent) {
        let reset = |c: Option<u64>| c.map(|_| 0);
        match component {
            VersionComponent::Major => {
                self.major += 1;
                self.minor = 0;
                self.patch = reset(self.patch);
                self.build = reset(self.build);
            }
            VersionComponent::Minor => {
                self.minor += 1;
                self.patch = reset(self.patch);
                self.build = reset(self.build);
            }
            VersionComponent::Patch => {
                self.patch = Some(self.patch.map_or(0, |p| p + 1));
                self.build = reset(self.build);
            }
            VersionComponent::Build => {
                self.build = Some(self.build.map_or(0, |b| b + 1));
            }
        }
    }

    /// Return a copy with `component` bumped.
    #[must_use]
    pub fn bumped(mut self, component: VersionComponent) -> Self {
        self.bump(component);
        self
    }

    /// The finest tracked component.
    pub const fn precision(&self) -> VersionComponent {
        match (self.patch, self.build) {
            (_, Some(_)) => VersionComponent::Build,
            (Some(_), None) => VersionComponent::Patch,
            (None, None) => VersionComponent::Minor,
        }
    }
}

/// Dotted form with as many components as are tracked.
///
/// A tracked build with an untracked patch writes the patch as `0` so the
/// build number is not lost on the next load.
impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        match (self.patch, self.build) {
            (None, None) => Ok(()),
            (Some(patch), None) => write!(f, ".{patch}"),
            (patch, Some(build)) => write!(f, ".{}.{build}", patch.unwrap_or(0)),
        }
    }
}

impl FromStr for VersionState {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}
