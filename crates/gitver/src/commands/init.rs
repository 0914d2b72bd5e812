//! Init command: write a starter version file in the current directory.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use gitver_core::config::Config;
use gitver_core::init::{self, InitTemplate};

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Starter document to write
    #[arg(short, long, value_enum, default_value_t)]
    pub template: InitTemplate,

    /// Base document for the inherited template (URL or path)
    #[arg(long, value_name = "URI")]
    pub inherit_from: Option<String>,

    /// Version the file starts at
    #[arg(long, value_name = "VERSION", default_value = "0.0.1")]
    pub initial_version: String,

    /// Overwrite an existing version file
    #[arg(short, long)]
    pub force: bool,
}

/// Write the starter file under the configured version file name.
#[instrument(name = "cmd_init", skip_all, fields(json_output))]
pub fn cmd_init(
    args: InitArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, template = ?args.template, "executing init command");

    let path = init::write_version_file(
        cwd,
        config.version_file_name(),
        args.template,
        &args.initial_version,
        args.inherit_from.as_deref(),
        args.force,
    )
    .context("failed to write version file")?;

    if global_json {
        let out = serde_json::json!({
            "path": path,
            "version": args.initial_version,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("  {} Wrote {}", "✓".green(), path.cyan());
    }
    Ok(())
}
