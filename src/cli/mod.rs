//! Command-line interface definitions for the `snapwarden` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `snapwarden` binary.
#[derive(Debug, Parser)]
#[command(
    name = "snapwarden",
    about = "Rotate Contabo instance snapshots and report the outcome",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Snapshot every instance, evicting the oldest snapshot on quota hits.
    #[command(
        name = "run",
        about = "Snapshot every instance, evicting the oldest snapshot on quota hits"
    )]
    Run(OutputArgs),
    /// List instances and the snapshot names a run would create.
    #[command(
        name = "plan",
        about = "List instances and the snapshot names a run would create"
    )]
    Plan(OutputArgs),
}

/// Output options shared by every subcommand.
#[derive(Debug, Parser)]
pub(crate) struct OutputArgs {
    /// Print the result as JSON instead of the plain-text report.
    #[arg(long)]
    pub(crate) json: bool,
}
