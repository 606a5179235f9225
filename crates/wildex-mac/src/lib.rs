//! macOS-specific implementation for wildex.
//!
//! This crate provides macOS network probing for the wildex project: the
//! default-route interface and per-interface link state.

#![cfg(target_os = "macos")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod net;

pub use net::{
    default_interface, interface_state, list_interfaces, parse_ifconfig, parse_route_get,
    InterfaceState,
};

/// Initialize macOS-specific components.
///
/// # Errors
///
/// Returns an error if `ifconfig` cannot be executed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Initializing macOS platform components");
    std::process::Command::new("ifconfig").arg("-l").output()?;
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "macOS"
}
