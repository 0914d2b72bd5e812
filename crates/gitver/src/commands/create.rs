//! Create command: release branches, tags, and branches named by schema.

use anyhow::Context;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use gitver_core::config::Config;
use gitver_core::error::ResolveError;
use gitver_core::git::VcsProvider;
use gitver_core::release;

use super::DirtyArgs;

/// Arguments for the `create` subcommand.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// What to create.
    #[command(subcommand)]
    pub target: CreateTarget,
}

/// Things `create` can make.
#[derive(Subcommand, Debug)]
pub enum CreateTarget {
    /// Branch off a release and bump the version on the current branch
    Release(ReleaseArgs),

    /// Tag HEAD with the rule's newTagSchema
    Tag(TagArgs),

    /// Create a branch at HEAD with a rule's newBranchSchema
    Branch(BranchArgs),
}

/// Arguments for `create release`.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Commit the version file after bumping
    #[arg(long)]
    pub commit: bool,

    /// Commit message ({oldVersion} and {newVersion} are replaced)
    #[arg(value_name = "MESSAGE", requires = "commit")]
    pub message: Option<String>,

    #[command(flatten)]
    pub dirty: DirtyArgs,
}

/// Arguments for `create tag`.
#[derive(Args, Debug, Default)]
pub struct TagArgs {
    /// Use the release rule's newTagSchema instead of the matched rule's
    #[arg(long)]
    pub release: bool,

    #[command(flatten)]
    pub dirty: DirtyArgs,
}

/// Arguments for `create branch`.
#[derive(Args, Debug, Default)]
pub struct BranchArgs {
    /// Key under `branches` whose newBranchSchema to use (defaults to the
    /// current branch name)
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    #[command(flatten)]
    pub dirty: DirtyArgs,
}

/// Execute the create command.
#[instrument(name = "cmd_create", skip_all, fields(json_output))]
pub fn cmd_create(
    args: CreateArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, target = ?args.target, "executing create command");
    match args.target {
        CreateTarget::Release(args) => create_release(args, global_json, config, cwd),
        CreateTarget::Tag(args) => create_tag(args, global_json, config, cwd),
        CreateTarget::Branch(args) => create_branch(args, global_json, config, cwd),
    }
}

fn create_release(
    args: ReleaseArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let (git, mut info) = super::resolve_version(cwd, config, args.dirty.ignore_dirty)?;
    if !super::confirm_dirty_write(&info, args.dirty)? {
        return Ok(());
    }

    let template = args
        .commit
        .then(|| args.message.unwrap_or_else(|| config.commit_message().to_string()));

    // Validate everything before touching the repository
    let plan = release::plan_release(&info, &git, template.as_deref())
        .context("release planning failed")?;
    let outcome = plan.execute(&mut info, &git).context("release failed")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "  {} Branch {} created",
            "✓".green(),
            outcome.branch_name.cyan()
        );
        println!(
            "  {} Version {} → {}",
            "✓".green(),
            outcome.previous.dimmed(),
            outcome.new.green().bold()
        );
        if outcome.committed {
            println!("  {} {} committed", "✓".green(), info.file().path());
        }
    }
    Ok(())
}

fn create_tag(
    args: TagArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let (git, info) = super::resolve_version(cwd, config, args.dirty.ignore_dirty)?;
    if !super::confirm_dirty_write(&info, args.dirty)? {
        return Ok(());
    }

    let name = info.new_tag_name(args.release)?;
    if git.tag_exists(&name)? {
        return Err(ResolveError::RefExists { kind: "tag", name }.into());
    }
    git.create_tag(&name)?;

    print_created("tag", &name, global_json)
}

fn create_branch(
    args: BranchArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let (git, info) = super::resolve_version(cwd, config, args.dirty.ignore_dirty)?;
    if !super::confirm_dirty_write(&info, args.dirty)? {
        return Ok(());
    }

    let current = &info.snapshot().branch_name;
    let name = match args.key.as_deref() {
        Some(key) => info.new_branch_name_from_key(key)?,
        None if info.file().config().branches.contains_key(current) => {
            info.new_branch_name_from_key(current)?
        }
        None => info.new_branch_name(false)?,
    };
    if git.branch_exists(&name)? {
        return Err(ResolveError::RefExists {
            kind: "branch",
            name,
        }
        .into());
    }
    git.create_branch(&name)?;

    print_created("branch", &name, global_json)
}

fn print_created(kind: &str, name: &str, global_json: bool) -> anyhow::Result<()> {
    if global_json {
        let out = serde_json::json!({ "kind": kind, "name": name });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("  {} Created {kind} {}", "✓".green(), name.cyan());
    }
    Ok(())
}
