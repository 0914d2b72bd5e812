//! Bump command: thin CLI layer over `VersionInfo::bump_version`.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use gitver_core::config::Config;
use gitver_core::version::VersionComponent;

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Component to bump: major, minor, patch, or build
    #[arg(value_name = "COMPONENT")]
    pub component: String,
}

/// Bump one component and persist the version file.
///
/// Finer components reset to zero where they are tracked.
#[instrument(name = "cmd_bump", skip_all, fields(json_output, component = %args.component))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing bump command");

    let component: VersionComponent = args
        .component
        .parse()
        .context("expected one of: major, minor, patch, build")?;

    let (_git, mut info) = super::resolve_version(cwd, config, true)?;
    let previous = info.version_state();
    info.bump_version(component)?;
    let new = info.version_state();

    if global_json {
        let out = serde_json::json!({
            "component": component,
            "previous": previous.to_string(),
            "version": new.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{}: {} → {}",
            "Version".bold(),
            previous.to_string().dimmed(),
            new.to_string().green().bold()
        );
    }

    Ok(())
}
