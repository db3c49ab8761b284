//! cocorestore - restore editable assets from a compiled Cocos Creator bundle.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cocorestore_cli::restore::{self, RestoreOptions};
use cocorestore_media::HttpFetcher;

/// Recover audio, sprite atlases, skeleton bundles and animation clips from
/// a compiled asset bundle.
#[derive(Parser)]
#[command(name = "cocorestore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Asset root; must contain the 'import' and 'native' subdirectories
    assets_root: PathBuf,

    /// Output directory, created if absent
    out_dir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let import_root = cli.assets_root.join("import");
    let native_root = cli.assets_root.join("native");
    if !import_root.is_dir() || !native_root.is_dir() {
        eprintln!(
            "{} asset root must contain 'import' and 'native' subdirectories: {}",
            "error:".red().bold(),
            cli.assets_root.display()
        );
        eprintln!("usage: cocorestore <assets_root> <out_dir>");
        return ExitCode::FAILURE;
    }

    let fetcher = HttpFetcher::default();
    let options = RestoreOptions {
        assets_root: cli.assets_root,
        out_dir: cli.out_dir,
    };
    match restore::run(&options, &fetcher) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
