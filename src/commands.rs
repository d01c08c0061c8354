//! CLI command definitions
//!
//! Defines the clap commands for the smoke runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario against the automation server
    Run {
        /// Built-in scenario name (see `smoke list`) or path to a YAML file
        scenario: Option<String>,

        #[command(flatten)]
        server: ServerArgs,

        /// Directory for hierarchy dumps
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Override the duration of every wait step (milliseconds)
        #[arg(long)]
        wait_ms: Option<u64>,

        /// Do not print the UI hierarchy returned by source steps
        #[arg(long)]
        quiet_source: bool,
    },

    /// Print the capabilities a run would send, without contacting the server
    Caps {
        /// Built-in scenario name or path to a YAML file
        scenario: Option<String>,

        /// Path to a config file (default: platform config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the built-in scenarios
    List,

    /// Check that the automation server is reachable
    Status {
        #[command(flatten)]
        server: ServerArgs,
    },
}

/// Where to find the automation server
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Automation server URL (overrides config and SMOKE_SERVER_URL)
    #[arg(long)]
    pub server: Option<String>,

    /// Path to a config file (default: platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
