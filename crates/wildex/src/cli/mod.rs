//! Command-line interface for wildex.
//!
//! This module provides the CLI structure for the `wildex` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, LocationArgs, LocationCommand, SimulateArg, StatusCommand, WatchCommand,
};

/// wildex - Connectivity and location tooling
///
/// Reports whether the device has internet-capable network access and
/// encodes, decodes and stores locations in their protobuf wire format.
#[derive(Debug, Parser)]
#[command(name = "wildex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show whether the device is online
    Status(StatusCommand),

    /// Print each online/offline transition
    Watch(WatchCommand),

    /// Encode, decode and store locations
    #[command(subcommand)]
    Location(LocationCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
