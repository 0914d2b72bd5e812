//! Parsing of user-supplied version strings.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use crate::version::{VersionError, VersionResult, VersionState};

/// Two to four dot-separated integers.
static VALID_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?(?:\.(\d+))?$").expect("valid version regex")
});

/// Validate and parse a version string such as `"1.2"`, `"1.2.3"`, or
/// `"1.2.3.4"`.
///
/// Surrounding whitespace is ignored; a `v` prefix is not accepted.
#[instrument]
pub fn parse_version(input: &str) -> VersionResult<VersionState> {
    let invalid = || VersionError::InvalidVersionFormat(input.to_string());
    let caps = VALID_VERSION_RE.captures(input.trim()).ok_or_else(invalid)?;

    let component = |i: usize| -> VersionResult<Option<u64>> {
        caps.get(i)
            .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
            .transpose()
    };

    let major = component(1)?.ok_or_else(invalid)?;
    let minor = component(2)?.ok_or_else(invalid)?;
    let version = VersionState::new(major, minor, component(3)?, component(4)?);
    debug!(%version, "validated explicit version");
    Ok(version)
}
