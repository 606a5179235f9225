//! Network interface probing for macOS.
//!
//! Shells out to the stock `route` and `ifconfig` tools and parses their output.

use std::process::Command;

use tracing::trace;

/// Link state of a single interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceState {
    /// Administratively up (`UP` flag).
    pub up: bool,
    /// Carrier present and operational.
    pub running: bool,
    /// Loopback device.
    pub loopback: bool,
}

/// Run a command and return its stdout if it exited successfully.
fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        trace!(program, ?args, status = ?output.status, "Probe command failed");
        None
    }
}

/// Extract the interface from `route -n get default` output.
#[must_use]
pub fn parse_route_get(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("interface:")?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Parse a single-interface `ifconfig <name>` report.
#[must_use]
pub fn parse_ifconfig(output: &str) -> Option<InterfaceState> {
    let header = output.lines().next()?;
    let start = header.find('<')?;
    let end = header[start..].find('>')? + start;
    let flags: Vec<&str> = header[start + 1..end].split(',').collect();

    let up = flags.contains(&"UP");
    let loopback = flags.contains(&"LOOPBACK");
    // Interfaces without a media line (lo0, utun) report no status at all
    let inactive = output
        .lines()
        .any(|line| line.trim() == "status: inactive");

    Some(InterfaceState {
        up,
        running: up && flags.contains(&"RUNNING") && !inactive,
        loopback,
    })
}

/// Interface carrying the default route.
#[must_use]
pub fn default_interface() -> Option<String> {
    let iface = parse_route_get(&run("route", &["-n", "get", "default"])?);
    trace!(?iface, "Resolved default route interface");
    iface
}

/// Names of all interfaces, sorted.
#[must_use]
pub fn list_interfaces() -> Vec<String> {
    let mut names: Vec<String> = run("ifconfig", &["-l"])
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

/// Link state of the named interface.
#[must_use]
pub fn interface_state(name: &str) -> Option<InterfaceState> {
    parse_ifconfig(&run("ifconfig", &[name])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_get() {
        let output = "   route to: default\ndestination: default\n       mask: default\n    gateway: 192.168.1.1\n  interface: en0\n      flags: <UP,GATEWAY,DONE,STATIC,PRCLONING>\n";
        assert_eq!(parse_route_get(output), Some("en0".to_string()));
    }

    #[test]
    fn test_parse_route_get_no_interface() {
        assert_eq!(parse_route_get("route: writing to routing socket: not in table\n"), None);
    }

    #[test]
    fn test_parse_ifconfig_active() {
        let output = "en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500\n\tether a4:83:e7:00:00:00\n\tstatus: active\n";
        let state = parse_ifconfig(output).unwrap();
        assert!(state.up);
        assert!(state.running);
        assert!(!state.loopback);
    }

    #[test]
    fn test_parse_ifconfig_inactive() {
        let output = "en1: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500\n\tstatus: inactive\n";
        let state = parse_ifconfig(output).unwrap();
        assert!(state.up);
        assert!(!state.running);
    }

    #[test]
    fn test_parse_ifconfig_loopback() {
        let output = "lo0: flags=8049<UP,LOOPBACK,RUNNING,MULTICAST> mtu 16384\n\tinet 127.0.0.1 netmask 0xff000000\n";
        let state = parse_ifconfig(output).unwrap();
        assert!(state.loopback);
        assert!(state.running);
    }

    #[test]
    fn test_parse_ifconfig_garbage() {
        assert_eq!(parse_ifconfig("ifconfig: interface ghost0 does not exist"), None);
        assert_eq!(parse_ifconfig(""), None);
    }
}
