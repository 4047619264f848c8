//! Command-line argument parsing for afconverge
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// afconverge - Replay capture-result traces through the AF/AE convergence machine
#[derive(Parser, Debug)]
#[command(name = "afconverge")]
#[command(version)]
#[command(about = "Replay capture-result traces through the AF/AE convergence machine", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only warnings and errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed a recorded observation trace through a session
    Replay {
        /// Trace file (JSON array or JSON lines of observations)
        #[arg(value_name = "TRACE")]
        trace: PathBuf,

        /// Run the pre-capture metering phase instead of the AF lock phase
        #[arg(long)]
        precapture: bool,

        /// Number of focus regions requested for the lock phase
        #[arg(long, default_value_t = 1)]
        regions: usize,

        /// Request cancellation after this many observations
        #[arg(long)]
        cancel_after: Option<usize>,

        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Log level for this verbosity, `None` keeps the configured level
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("warn"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("debug"),
            Verbosity::VeryVerbose => Some("trace"),
        }
    }
}
