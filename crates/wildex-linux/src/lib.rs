//! Linux-specific implementation for wildex
//!
//! This crate provides Linux network probing for the wildex project. It reads
//! the kernel routing table from procfs and interface flags from sysfs; no
//! network traffic is generated.

#![cfg(target_os = "linux")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod net;

pub use net::{
    default_interface, default_interface_in, interface_state, interface_state_in, list_interfaces,
    list_interfaces_in, parse_default_route, InterfaceState,
};

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if the procfs routing table is not readable.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::metadata(net::PROC_NET_ROUTE)?;
    tracing::debug!("Linux network probing available");
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}
