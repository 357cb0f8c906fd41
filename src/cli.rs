//! Command-line surface for the `tangle` binary.

use clap::Parser;
use std::path::PathBuf;

/// Extract and expand source blocks out of outline/markup documents.
#[derive(Parser, Debug)]
#[command(name = "tangle", version, about, long_about = None)]
pub struct Cli {
    /// Documents to tangle. Directories are searched recursively for `.org`
    /// files; if empty, the current directory is searched.
    pub paths: Vec<PathBuf>,

    /// Root the stale-cache cleanup pass scans and prunes under. Does not
    /// redirect where tangled targets are written; those paths stay
    /// governed by each block's `tangle` directive.
    #[arg(long, default_value = "dist")]
    pub out_dir: PathBuf,

    /// Report what would be written without touching disk.
    #[arg(long)]
    pub dry_run: bool,

    /// Raise log verbosity to debug.
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the post-tangle stale-cache cleanup pass.
    #[arg(long)]
    pub no_clean: bool,
}
