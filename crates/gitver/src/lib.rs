//! Library interface for the `gitver` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG           Log filter (e.g., debug, gitver_core=trace)
    GITVER_LOG_PATH    Explicit log file path
    GITVER_LOG_DIR     Log directory
";

/// Command-line interface definition for gitver.
#[derive(Parser)]
#[command(name = "gitver")]
#[command(about = "Git-aware versioning driven by a version.yml file", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to settings file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail in the log file (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Echo debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Echo trace logs to stderr, including rule match attempts
    #[arg(long, global = true)]
    pub trace: bool,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the current version
    Get(commands::get::GetArgs),

    /// Set the version in the version file
    Set(commands::set::SetArgs),

    /// Bump one version component
    Bump(commands::bump::BumpArgs),

    /// Create a release branch, a tag, or a branch
    Create(commands::create::CreateArgs),

    /// Write a starter version file
    Init(commands::init::InitArgs),

    /// Show package, settings, and version information
    Info(commands::info::InfoArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn create_release_message_requires_commit() {
        let parsed = Cli::try_parse_from(["gitver", "create", "release", "msg"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from(["gitver", "create", "release", "--commit", "msg"]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitver", "get", "--debug", "--json"]).unwrap();
        assert!(cli.debug);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Get(_)));
    }
}
