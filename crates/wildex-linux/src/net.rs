//! Network interface probing via procfs and sysfs.
//!
//! Every probe is a handful of small file reads. Missing files or
//! unparseable contents yield `None` rather than an error, since an
//! interface can disappear between listing and reading it.

use std::fs;
use std::path::Path;

use tracing::trace;

/// Kernel IPv4 routing table.
pub const PROC_NET_ROUTE: &str = "/proc/net/route";

/// Directory holding one entry per network interface.
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// `IFF_UP` from `<net/if.h>`.
const IFF_UP: u32 = 0x1;

/// `IFF_LOOPBACK` from `<net/if.h>`.
const IFF_LOOPBACK: u32 = 0x8;

/// `RTF_UP` from `<linux/route.h>`.
const RTF_UP: u32 = 0x1;

/// Link state of a single interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceState {
    /// Administratively up (`IFF_UP`).
    pub up: bool,
    /// Up and reported operational by `operstate`.
    pub running: bool,
    /// Loopback device.
    pub loopback: bool,
}

/// Find the interface carrying the default IPv4 route.
///
/// When several default routes exist the one with the lowest metric wins.
pub fn parse_default_route(contents: &str) -> Option<String> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                return None;
            }
            let flags = u32::from_str_radix(fields[3], 16).ok()?;
            let metric: u32 = fields[6].parse().ok()?;
            let is_default = fields[1] == "00000000" && fields[7] == "00000000";
            (is_default && flags & RTF_UP != 0).then(|| (metric, fields[0].to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}

/// Interface carrying the default route, read from [`PROC_NET_ROUTE`].
#[must_use]
pub fn default_interface() -> Option<String> {
    default_interface_in(Path::new(PROC_NET_ROUTE))
}

/// Like [`default_interface`] but reading an arbitrary route table file.
#[must_use]
pub fn default_interface_in(route_table: &Path) -> Option<String> {
    let contents = fs::read_to_string(route_table).ok()?;
    let iface = parse_default_route(&contents);
    trace!(?iface, "Resolved default route interface");
    iface
}

/// Names of all interfaces under [`SYS_CLASS_NET`], sorted.
#[must_use]
pub fn list_interfaces() -> Vec<String> {
    list_interfaces_in(Path::new(SYS_CLASS_NET))
}

/// Like [`list_interfaces`] but reading an arbitrary sysfs directory.
#[must_use]
pub fn list_interfaces_in(sys_class_net: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(sys_class_net) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Link state of the named interface.
#[must_use]
pub fn interface_state(name: &str) -> Option<InterfaceState> {
    interface_state_in(Path::new(SYS_CLASS_NET), name)
}

/// Like [`interface_state`] but reading an arbitrary sysfs directory.
#[must_use]
pub fn interface_state_in(sys_class_net: &Path, name: &str) -> Option<InterfaceState> {
    let dir = sys_class_net.join(name);
    let raw_flags = fs::read_to_string(dir.join("flags")).ok()?;
    let flags = u32::from_str_radix(raw_flags.trim().trim_start_matches("0x"), 16).ok()?;

    // sysfs `flags` is dev->flags and never carries IFF_RUNNING; link state
    // comes from operstate. "unknown" covers loopback and virtual links
    // (tun, ppp) that still pass traffic.
    let operstate = fs::read_to_string(dir.join("operstate")).unwrap_or_default();
    let oper_ok = matches!(operstate.trim(), "up" | "unknown");
    let up = flags & IFF_UP != 0;

    Some(InterfaceState {
        up,
        running: up && oper_ok,
        loopback: flags & IFF_LOOPBACK != 0,
    })
}
