use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct ManArgs {
    /// Output directory (default: dist/share/man/man1)
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let out_dir = crate::workspace_root().join(args.out_dir);
    fs::create_dir_all(&out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;

    // Top-level page plus one page per (nested) subcommand: gitver-create-release.1
    render_tree(&gitver::command(), "gitver", &out_dir)
}

fn render_tree(cmd: &clap::Command, page_name: &str, out_dir: &Path) -> Result<(), String> {
    let man = clap_mangen::Man::new(cmd.clone().name(page_name.to_string()));
    let mut buffer: Vec<u8> = Vec::new();
    man.render(&mut buffer)
        .map_err(|e| format!("render manpage for {page_name}: {e}"))?;

    let man_path = out_dir.join(format!("{page_name}.1"));
    fs::write(&man_path, buffer).map_err(|e| format!("{}: {e}", man_path.display()))?;
    println!("wrote {}", man_path.display());

    for subcommand in cmd.get_subcommands() {
        let child = format!("{page_name}-{}", subcommand.get_name());
        render_tree(subcommand, &child, out_dir)?;
    }
    Ok(())
}
