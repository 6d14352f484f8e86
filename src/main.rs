mod ansi;
mod cli;
mod config;
mod diff;
mod document;
mod render;
#[allow(dead_code)]
mod resolve;
mod store;
mod vcs;

use anyhow::Result;
use clap::Parser;
use std::env;

use crate::cli::Cli;
use crate::store::DocumentStore;
use crate::vcs::VcsError;

fn main() -> Result<()> {
    color_eyre::install().ok();
    env_logger::init();

    let cli = Cli::parse();

    let cwd = match cli.path.clone() {
        Some(path) => path,
        None => env::current_dir()?,
    };

    // Load config, apply CLI overrides (CLI wins)
    let mut config = config::load_config();
    if let Some(tool) = cli.tool {
        config.diff_tool = tool;
    }
    if let Some(bin) = cli.jj_bin {
        config.jj_bin = bin;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    if cli.save {
        config::save_settings(&config);
    }

    let mut store = DocumentStore::new(&config);
    let rendered = match store.open(&cwd) {
        Ok(open) => render::render_document(&open.document, cli.expand_all),
        Err(e) => {
            if matches!(e.downcast_ref::<VcsError>(), Some(VcsError::NotARepository)) {
                eprintln!(
                    "jjview: not a jj repository (or any parent up to the filesystem root)\n\
                     Run this command from inside a jj workspace."
                );
            } else {
                eprintln!("jjview: {e:#}");
            }
            std::process::exit(1);
        }
    };

    print!("{rendered}");
    Ok(())
}
