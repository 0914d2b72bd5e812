//! Set command: write an explicit version into the version file.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use gitver_core::config::Config;

/// Arguments for the `set` subcommand.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// New version, `major.minor[.patch[.build]]`
    #[arg(value_name = "VERSION")]
    pub version: String,
}

/// Validate and persist `args.version`.
#[instrument(name = "cmd_set", skip_all, fields(json_output, version = %args.version))]
pub fn cmd_set(
    args: SetArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing set command");

    let (_git, mut info) = super::resolve_version(cwd, config, true)?;
    let previous = info.version_state();
    info.set_version(Some(&args.version))?;
    let new = info.version_state();

    if global_json {
        let out = serde_json::json!({
            "previous": previous.to_string(),
            "version": new.to_string(),
            "version_file": info.file().path(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} Version set: {} → {}",
            "✓".green(),
            previous.to_string().dimmed(),
            new.to_string().green().bold()
        );
    }

    Ok(())
}
