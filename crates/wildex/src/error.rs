//! Error types for wildex.
//!
//! Connectivity probing and the field mapping of the location codec are
//! infallible; the variants here cover the outer surfaces: byte decoding,
//! storage, configuration and platform registration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for wildex operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Location Errors ===
    /// Stored or transmitted bytes are not a valid location message.
    #[error("corrupt location data: {0}")]
    LocationDecode(#[from] prost::DecodeError),

    /// A location was rejected by the coordinate range check.
    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    CoordinatesOutOfRange {
        /// The offending latitude.
        latitude: f64,
        /// The offending longitude.
        longitude: f64,
    },

    /// Hex input could not be parsed.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    // === Platform Errors ===
    /// Registering a network callback with the platform failed.
    #[error("failed to register network callback: {message}")]
    CallbackRegister {
        /// Description of what went wrong.
        message: String,
    },

    /// The callback id is unknown to the platform.
    #[error("network callback {id} is not registered")]
    CallbackNotRegistered {
        /// The id passed to unregister.
        id: u64,
    },

    /// Platform-specific operation failed.
    #[error("platform error: {0}")]
    Platform(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for wildex operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new platform error.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a callback registration error.
    #[must_use]
    pub fn callback_register(message: impl Into<String>) -> Self {
        Self::CallbackRegister {
            message: message.into(),
        }
    }

    /// Check if this error means stored data could not be decoded.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::LocationDecode(_))
    }
}
