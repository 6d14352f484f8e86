use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jjview",
    version,
    about = "Collapsible status/diff document viewer for Jujutsu repositories"
)]
pub struct Cli {
    /// Project directory to inspect (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Diff tool passed through to `jj diff --tool`
    #[arg(long)]
    pub tool: Option<String>,

    /// jj executable to invoke
    #[arg(long = "jj-bin")]
    pub jj_bin: Option<String>,

    /// Per-invocation subprocess timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print file section bodies instead of collapsed titles
    #[arg(long)]
    pub expand_all: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    pub save: bool,
}
