//! Command implementations

pub mod bump;

pub mod create;

pub mod get;

pub mod info;

pub mod init;

pub mod set;

use std::io::IsTerminal;

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use inquire::Confirm;
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use gitver_core::config::Config;
use gitver_core::git::GitCli;
use gitver_core::resolve::{ResolveOptions, VersionInfo};

/// `--ignore-dirty`, shared by commands that render the commit hash.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct DirtyArgs {
    /// Use the real commit hash even when the working tree is dirty
    #[arg(short = 'i', long)]
    pub ignore_dirty: bool,
}

/// Open the repository around `cwd` and resolve the version.
///
/// Shared across every command that reads the version file.
pub fn resolve_version(
    cwd: &Utf8Path,
    config: &Config,
    allow_dirty: bool,
) -> anyhow::Result<(GitCli, VersionInfo)> {
    let git = GitCli::new(cwd).context("git is required")?;
    let options = ResolveOptions {
        allow_dirty,
        version_file_name: config.version_file_name().to_string(),
    };
    let info = VersionInfo::resolve(&git, cwd, &options)?;
    Ok((git, info))
}

/// Ask before writing refs from a dirty working tree.
///
/// Returns `false` when the user declines. Without a terminal the write
/// goes ahead with a warning.
pub fn confirm_dirty_write(info: &VersionInfo, dirty: DirtyArgs) -> anyhow::Result<bool> {
    if !info.snapshot().is_dirty || dirty.ignore_dirty {
        return Ok(true);
    }

    if !std::io::stdin().is_terminal() {
        warn!("working tree is dirty, continuing without confirmation");
        eprintln!(
            "{} working tree has uncommitted changes, using '{}' as the commit hash",
            "warning:".yellow().bold(),
            info.commit_hash()
        );
        return Ok(true);
    }

    let proceed = Confirm::new("The working tree has uncommitted changes. Continue anyway?")
        .with_default(false)
        .with_help_message("Pass --ignore-dirty to skip this question")
        .prompt()
        .context("confirmation cancelled")?;
    debug!(proceed, "dirty working tree confirmation");
    if !proceed {
        println!("{}", "Cancelled.".yellow());
    }
    Ok(proceed)
}
