//! Device farm smoke runner
//!
//! Drives a mobile app through an Appium/WebDriver automation server, runs a
//! short scenario and exits non-zero if anything failed.

use std::path::PathBuf;

use clap::Parser;
use smoke::{cli, common::logging, commands::Commands};

#[derive(Parser)]
#[command(name = "smoke", about = "Smoke tests for mobile apps over WebDriver")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write detailed logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let result = cli::dispatch(cli.command, cli.verbose).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        // exit() skips destructors; flush the file log first
        drop(log_guard);
        std::process::exit(1);
    }
}
