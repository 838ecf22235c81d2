//! CLI command definitions and execution
//!
//! Browsing is the default command; the others manage preferences and
//! shell completions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod completions;
mod pref;
mod traverse;

/// s3pick - browse S3 interactively and print the picked object
///
/// Filter each level by typing, drill in with Enter or Right, go back with
/// Left. Ctrl+P copies the path, Ctrl+D downloads, Ctrl+R re-lists a
/// directory, Ctrl+C quits.
#[derive(Parser, Debug)]
#[command(name = "s3pick")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable the spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, env = "S3PICK_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub browse: traverse::TraverseArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse buckets, or a bucket/prefix, and print the selected object (default)
    Traverse(traverse::TraverseArgs),

    /// Manage preferences
    #[command(subcommand)]
    Pref(pref::PrefCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        None => traverse::execute(cli.browse, output_config).await,
        Some(Commands::Traverse(args)) => traverse::execute(args, output_config).await,
        Some(Commands::Pref(cmd)) => pref::execute(cmd, output_config),
        Some(Commands::Completions(args)) => completions::execute(args),
    }
}
