//! Info command: show package, settings, and version information.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use gitver_core::config::{self, Config};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct SettingsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_config_dir: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    version_file_name: String,
    commit_message: String,
}

impl SettingsInfo {
    fn from_config(config: &Config, cwd: &camino::Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            user_config_dir: config::user_config_dir().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            version_file_name: config.version_file_name().to_string(),
            commit_message: config.commit_message().to_string(),
        }
    }
}

/// Version resolution outcome; never fails the command.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum VersionStatus {
    Resolved {
        version_file: String,
        rule: String,
        version: String,
        branch: String,
        commit_short_hash: String,
        dirty: bool,
    },
    Unavailable {
        reason: String,
    },
}

impl VersionStatus {
    fn detect(config: &Config, cwd: &camino::Utf8Path) -> Self {
        let resolved = super::resolve_version(cwd, config, false).and_then(|(_git, mut info)| {
            let summary = info.summary(None)?;
            Ok(Self::Resolved {
                version_file: summary.version_file.to_string(),
                rule: summary.rule,
                version: summary.version,
                branch: summary.branch,
                commit_short_hash: summary.commit_short_hash,
                dirty: summary.dirty,
            })
        });
        resolved.unwrap_or_else(|err| {
            debug!(error = %err, "version unavailable");
            Self::Unavailable {
                reason: format!("{err:#}"),
            }
        })
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    settings: SettingsInfo,
    version_info: VersionStatus,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded settings
/// * `cwd` - Current working directory for settings and version file discovery
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        settings: SettingsInfo::from_config(config, cwd),
        version_info: VersionStatus::detect(config, cwd),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    let package = &full_info.package;
    println!("{} {}", package.name.bold(), package.version.green());
    if !package.description.is_empty() {
        println!("{}", package.description);
    }
    if !package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), package.license);
    }
    if !package.repository.is_empty() {
        println!("{}: {}", "Repository".dimmed(), package.repository.cyan());
    }

    let settings = &full_info.settings;
    println!();
    println!("{}", "Settings".bold().underline());
    if let Some(ref path) = settings.config_file {
        println!("{}: {}", "Settings file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Settings file".dimmed(), "none loaded".yellow());
    }
    if let Some(ref dir) = settings.user_config_dir {
        println!("{}: {}", "User settings".dimmed(), dir);
    }
    println!("{}: {}", "Log level".dimmed(), settings.log_level);
    if let Some(ref dir) = settings.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!("{}: {}", "Version file name".dimmed(), settings.version_file_name);
    println!("{}: {}", "Commit message".dimmed(), settings.commit_message);

    println!();
    println!("{}", "Version".bold().underline());
    match &full_info.version_info {
        VersionStatus::Resolved {
            version_file,
            rule,
            version,
            branch,
            commit_short_hash,
            dirty,
        } => {
            println!("{}: {}", "Version file".dimmed(), version_file.cyan());
            println!("{}: {}", "Branch".dimmed(), branch);
            let hash = if *dirty {
                format!("{commit_short_hash} (dirty)")
            } else {
                commit_short_hash.clone()
            };
            println!("{}: {}", "Commit".dimmed(), hash);
            println!("{}: {}", "Rule".dimmed(), rule.cyan());
            println!("{}: {}", "Version".dimmed(), version.green().bold());
        }
        VersionStatus::Unavailable { reason } => {
            println!("  {} {}", "○".yellow(), reason.yellow());
        }
    }

    Ok(())
}
