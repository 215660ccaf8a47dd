use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

#[path = "src/cli.rs"]
mod cli;

/// Subcommands that get their own page. `completions` is covered by the
/// top-level page.
const PAGED_SUBCOMMANDS: &[&str] = &["run", "check-config"];

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR is not set"))?;
    let man_dir = out_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;

    let krms = cli::Cli::command();
    write_page(&krms, "krms", &man_dir)?;

    for name in PAGED_SUBCOMMANDS {
        let sub = krms
            .find_subcommand(name)
            .ok_or_else(|| io::Error::other(format!("no `{name}` subcommand")))?;
        write_page(sub, &format!("krms-{name}"), &man_dir)?;
    }
    Ok(())
}

/// Render `cmd` as section-1 page `<title>.1` in `dir`.
fn write_page(cmd: &clap::Command, title: &str, dir: &Path) -> io::Result<()> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone().name(title.to_owned())).render(&mut page)?;
    std::fs::write(dir.join(format!("{title}.1")), page)
}
