//! `wildex` - Network connectivity observation and location encoding
//!
//! This library tracks whether the device currently has internet-capable
//! network access, and converts locations to and from their protobuf wire
//! format for storage and transmission.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod location;
pub mod logging;
pub mod storage;

pub use config::Config;
pub use connectivity::{
    ConnectivityObserver, MemoryNetwork, NetworkEvent, NetworkHandle, NetworkPlatform,
    SystemNetwork,
};
pub use error::{Error, Result};
pub use location::{Location, LocationCodec, WireLocation};
pub use logging::init_logging;
pub use storage::{LocationStore, StoredLocation};
