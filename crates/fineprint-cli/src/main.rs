//! fineprint CLI
//!
//! Command-line access to diffing, archive-markup stripping, snapshot
//! selection, and end-to-end change detection.

use clap::{Parser, Subcommand};
use fineprint_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "fineprint")]
#[command(about = "fineprint - track changes to legal policy documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Unified diff of two text files
    Diff(commands::diff::DiffArgs),
    /// Remove archive-injected markup from a file or stdin
    Strip(commands::strip::StripArgs),
    /// List archived captures of a URL and the one treated as prior
    Snapshots(commands::snapshots::SnapshotsArgs),
    /// Compare a live policy against its prior capture
    Check(commands::check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    init(Profile::Development);

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Strip(args) => commands::strip::execute(args),
        Commands::Snapshots(args) => commands::snapshots::execute(args),
        Commands::Check(args) => commands::check::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
