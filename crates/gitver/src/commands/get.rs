//! Get command: print the version for the current repository state.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use gitver_core::config::Config;
use gitver_core::git::RefKind;
use gitver_core::resolve::VersionSummary;

use super::DirtyArgs;

/// Arguments for the `get` subcommand.
#[derive(Args, Debug, Default)]
pub struct GetArgs {
    /// Print only the leading numeric part (e.g. 1.2.3)
    #[arg(short, long)]
    pub numeric: bool,

    /// Render with this schema instead of the matched rule's
    #[arg(long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    #[command(flatten)]
    pub dirty: DirtyArgs,
}

/// Print the current version.
///
/// Stdout carries only the version (or the JSON summary) so the output can
/// be captured by scripts. With `show_tree` a diagnostic tree goes to stderr.
#[instrument(name = "cmd_get", skip_all, fields(json_output, numeric = args.numeric))]
pub fn cmd_get(
    args: GetArgs,
    global_json: bool,
    show_tree: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing get command");

    let (_git, mut info) = super::resolve_version(cwd, config, args.dirty.ignore_dirty)?;
    let summary = info
        .summary(args.schema.as_deref())
        .context("failed to render version")?;

    if show_tree {
        print_tree(&summary);
    }

    if global_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if args.numeric {
        println!("{}", info.numeric_version()?);
    } else {
        println!("{}", summary.version);
    }

    Ok(())
}

fn print_tree(summary: &VersionSummary) {
    let component = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let c = &summary.components;
    let refs: Vec<String> = summary
        .search_refs
        .iter()
        .map(|r| match r.kind {
            RefKind::Tag => format!("tag {}", r.name),
            RefKind::Branch => format!("branch {}", r.name),
        })
        .collect();
    let mut commit = summary.commit_short_hash.clone();
    if summary.dirty {
        commit.push_str(" (dirty)");
    }
    let mut branch = summary.branch.clone();
    if summary.detached {
        branch.push_str(" (detached)");
    }

    eprintln!("{}", summary.version_file.bold());
    let rows = [
        (
            "components",
            format!(
                "major={} minor={} patch={} build={}",
                c.major,
                c.minor,
                component(c.patch),
                component(c.build)
            ),
        ),
        ("prerelease tag", summary.prerelease_tag.clone()),
        ("commit", commit),
        ("branch", branch),
        ("tags", summary.tags.join(", ")),
        ("search refs", refs.join(", ")),
        ("rule", summary.rule.clone()),
        ("version", summary.version.clone()),
    ];
    let last = rows.len() - 1;
    for (i, (label, value)) in rows.iter().enumerate() {
        let branch_glyph = if i == last { "└─" } else { "├─" };
        eprintln!("{} {}: {}", branch_glyph.dimmed(), label.dimmed(), value.cyan());
    }
}
