//! gitver CLI
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use gitver::{Cli, Commands, commands};
use gitver_core::config::ConfigLoader;
use tracing::debug;

mod observability;

use observability::ConsoleMode;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let console = ConsoleMode::from_flags(cli.debug, cli.trace);
    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
        console,
    );
    let env_filter =
        observability::env_filter(cli.quiet, cli.verbose, console, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging/tracing")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        console = ?console,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let show_tree = console != ConsoleMode::Off;
    let result = match cli.command {
        Commands::Get(args) => commands::get::cmd_get(args, cli.json, show_tree, &config, &cwd),
        Commands::Set(args) => commands::set::cmd_set(args, cli.json, &config, &cwd),
        Commands::Bump(args) => commands::bump::cmd_bump(args, cli.json, &config, &cwd),
        Commands::Create(args) => commands::create::cmd_create(args, cli.json, &config, &cwd),
        Commands::Init(args) => commands::init::cmd_init(args, cli.json, &config, &cwd),
        Commands::Info(args) => commands::info::cmd_info(args, cli.json, &config, &cwd),
    };
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
