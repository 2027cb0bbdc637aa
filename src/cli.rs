//! Command-line interface definitions for dirsnap.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for dirsnap.
#[derive(Parser)]
#[command(
    name = "dirsnap",
    version = crate::VERSION,
    about = "Detect what changed in a directory since its last snapshot",
    long_about = "Fingerprints a directory's immediate entries with SHA-256, reports new, \
                  changed, and deleted entries since the previous run, and stores the new snapshot"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory and report changes since its last snapshot
    Analyze {
        /// Directory to analyze
        directory: PathBuf,

        /// One `X path` line per change
        #[arg(short, long, conflicts_with = "json")]
        short: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored snapshot of a directory without scanning
    Show {
        /// Directory whose snapshot to print
        directory: PathBuf,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every directory with a stored snapshot
    List,

    /// Remove a directory's stored snapshot
    Forget {
        /// Directory to forget
        directory: PathBuf,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
