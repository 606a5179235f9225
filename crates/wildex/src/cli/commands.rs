//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::location::Location;

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Use a simulated network instead of the host
    #[arg(long, value_enum)]
    pub simulate: Option<SimulateArg>,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Exit after this many transitions
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

/// Coordinates and names shared by the location commands.
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// Latitude in degrees
    #[arg(long = "lat", allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude in degrees
    #[arg(long = "lon", allow_negative_numbers = true)]
    pub longitude: f64,

    /// Display name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Fine-grained place name
    #[arg(long, default_value = "")]
    pub specific: String,

    /// Coarse region name
    #[arg(long, default_value = "")]
    pub general: String,

    /// Reject coordinates outside the valid latitude/longitude ranges
    #[arg(long)]
    pub strict: bool,
}

impl LocationArgs {
    /// Build the location described by these arguments.
    #[must_use]
    pub fn to_location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
            .with_name(self.name.clone())
            .with_specific_name(self.specific.clone())
            .with_general_name(self.general.clone())
    }
}

/// Location codec and storage commands.
#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// Encode a location and print the bytes as hex
    Encode(LocationArgs),

    /// Decode hex-encoded bytes into a location
    Decode {
        /// Hex-encoded payload
        hex: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Store a location under a key
    Save {
        /// Key to store under
        key: String,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Load a stored location
    Load {
        /// Key to load
        key: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List stored locations, most recently updated first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Remove a stored location
    Remove {
        /// Key to remove
        key: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Simulated network state for `status --simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimulateArg {
    /// No active network
    Offline,
    /// One active internet-capable network
    Online,
}
