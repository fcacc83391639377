//! Command-line argument parsing for toolflow
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// toolflow - plan, execute and analyze tool calls for a natural-language request
#[derive(Parser, Debug)]
#[command(name = "toolflow")]
#[command(version)]
#[command(about = "Turn a natural-language request into executed tool calls", long_about = None)]
pub struct Args {
    /// Natural-language request to fulfil
    #[arg(value_name = "REQUEST")]
    pub request: Option<String>,

    /// Reasoning model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Reasoning service host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Reasoning service port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Tool catalog JSON file (overrides config)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print a readable summary instead of JSON
    #[arg(long)]
    pub human: bool,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except final result)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tools in the catalog
    Tools,

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

    /// Check that exactly one of request/subcommand was given
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_none() && self.request.is_none() {
            return Err("Request required. Use 'toolflow <REQUEST>' or run a subcommand.".to_string());
        }

        if self.command.is_some() && self.request.is_some() {
            return Err("Cannot specify request with subcommand.".to_string());
        }

        Ok(())
    }
}

impl Verbosity {
    /// Parse a configured verbosity name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Default log filter for this verbosity
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
