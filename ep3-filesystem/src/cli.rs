use std::path::PathBuf;

use clap::Parser;

/// Interactive FAT-style filesystem shell over a single backing image file.
///
/// Mirrors the original coursework invocation: with no arguments it reads
/// commands from standard input until `sai`; `-c` runs one command and
/// exits; `--image` mounts a file before the first prompt is shown.
#[derive(Debug, Parser)]
#[command(name = "ep3", about = "FAT-style filesystem shell")]
pub struct Cli {
    /// Mount this image immediately, before the first prompt.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Run a single command (e.g. `-c "mkdir /docs"`) and exit instead of
    /// starting the interactive loop.
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,
}
