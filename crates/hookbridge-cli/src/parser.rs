//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the hookbridge Python runtime.
#[derive(Parser)]
#[command(name = "hookbridge")]
#[command(about = "Resolve and manage the Python runtime behind hookbridge plugins")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML). Defaults to config.yaml in the working directory
    #[arg(short, long, global = true, env = "HOOKBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
