//! s3pick - interactive S3 browser
//!
//! Walks buckets and prefixes with an incremental filter and prints the
//! `s3://` path of the picked object.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use s3pick::commands::{self, Cli};
use s3pick::exit_code::ExitCode;

/// Log filter for `--debug`
const DEBUG_FILTER: &str = "s3pick=debug,pick_core=debug,pick_s3=debug";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries only the selection
    let filter = if cli.debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::from_default_env()
    };
    let log_file = match cli.log_file.as_deref().map(open_log).transpose() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open log file: {e}");
            std::process::exit(ExitCode::UsageError.as_i32());
        }
    };
    let (to_file, to_stderr) = match log_file {
        Some(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        None => (None, Some(fmt::layer().with_writer(std::io::stderr))),
    };
    tracing_subscriber::registry()
        .with(to_file)
        .with(to_stderr)
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}

fn open_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
