//! Host operating system network platform.
//!
//! Probes go through the platform crate for the current target. Events come
//! from a poll task that compares interface snapshots per registration.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::{
    Capabilities, Capability, CallbackId, CallbackRegistry, NetworkCallback, NetworkEvent,
    NetworkHandle, NetworkPlatform, NetworkRequest,
};
use crate::error::{Error, Result};

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod host {
    #[cfg(target_os = "linux")]
    use wildex_linux as platform;

    #[cfg(target_os = "macos")]
    use wildex_mac as platform;

    pub use platform::{default_interface, list_interfaces, platform_name};

    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        platform::init()
    }

    /// `(running, loopback)` for the named interface.
    pub fn link(name: &str) -> Option<(bool, bool)> {
        platform::interface_state(name).map(|state| (state.running, state.loopback))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod host {
    pub fn default_interface() -> Option<String> {
        None
    }

    pub fn list_interfaces() -> Vec<String> {
        Vec::new()
    }

    pub fn platform_name() -> &'static str {
        "unsupported"
    }

    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    pub fn link(_name: &str) -> Option<(bool, bool)> {
        None
    }
}

/// Name of the host platform.
#[must_use]
pub fn platform_name() -> &'static str {
    host::platform_name()
}

/// Capabilities for an interface given its link state and routing.
///
/// Only a running, non-loopback interface that carries the default route is
/// internet-capable.
#[must_use]
pub fn derive_capabilities(running: bool, loopback: bool, carries_default: bool) -> Capabilities {
    let mut caps = Capabilities::empty();
    if running {
        caps = caps.with(Capability::Running);
    }
    if loopback {
        caps = caps.with(Capability::Loopback);
    }
    if running && !loopback && carries_default {
        caps = caps.with(Capability::Internet);
    }
    caps
}

/// Events that turn `previous` into `current`: `Lost` first, then `Available`.
#[must_use]
pub fn reconcile(
    previous: &BTreeSet<NetworkHandle>,
    current: &BTreeSet<NetworkHandle>,
) -> Vec<NetworkEvent> {
    previous
        .difference(current)
        .cloned()
        .map(NetworkEvent::Lost)
        .chain(current.difference(previous).cloned().map(NetworkEvent::Available))
        .collect()
}

/// [`NetworkPlatform`] backed by the host OS.
///
/// Network handles are interface names. The first poll after a callback
/// registers reports every matching interface as `Available`.
pub struct SystemNetwork {
    callbacks: CallbackRegistry,
    known: Mutex<HashMap<CallbackId, BTreeSet<NetworkHandle>>>,
    poll_interval: Duration,
    stopped: AtomicBool,
}

impl std::fmt::Debug for SystemNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemNetwork")
            .field("platform", &platform_name())
            .field("callbacks", &self.callbacks)
            .field("poll_interval", &self.poll_interval)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

impl SystemNetwork {
    /// Create a platform without starting the poll task.
    ///
    /// Events are only delivered when [`Self::poll_once`] is called.
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            callbacks: CallbackRegistry::new(),
            known: Mutex::new(HashMap::new()),
            poll_interval,
            stopped: AtomicBool::new(false),
        }
    }

    /// Create a platform and start its poll task on the current tokio runtime.
    ///
    /// The task ends when the returned `Arc` is dropped or [`Self::stop`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if `poll_interval` is zero, if called outside a tokio
    /// runtime, or if platform initialisation fails.
    pub fn spawn(poll_interval: Duration) -> Result<Arc<Self>> {
        if poll_interval.is_zero() {
            return Err(Error::platform("poll interval must be greater than zero"));
        }
        host::init().map_err(|e| Error::platform(e.to_string()))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::platform(format!("no async runtime: {e}")))?;

        let net = Arc::new(Self::new(poll_interval));
        runtime.spawn(poll_loop(Arc::downgrade(&net), poll_interval));
        debug!(
            platform = platform_name(),
            interval_ms = poll_interval.as_millis(),
            "Started system network poller"
        );
        Ok(net)
    }

    /// Signal the poll task to stop.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether [`Self::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Configured interval between polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn known(&self) -> MutexGuard<'_, HashMap<CallbackId, BTreeSet<NetworkHandle>>> {
        self.known.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every interface currently reported, with its capabilities.
    #[must_use]
    pub fn scan(&self) -> BTreeMap<NetworkHandle, Capabilities> {
        let default = host::default_interface();
        host::list_interfaces()
            .into_iter()
            .filter_map(|name| {
                let (running, loopback) = host::link(&name)?;
                let carries_default = default.as_deref() == Some(name.as_str());
                let caps = derive_capabilities(running, loopback, carries_default);
                Some((NetworkHandle::new(name), caps))
            })
            .collect()
    }

    /// Take one snapshot and deliver the resulting events. Blocks on probes.
    pub fn poll_once(&self) {
        let snapshot = self.scan();
        trace!(interfaces = snapshot.len(), "Polled network interfaces");
        self.apply(&snapshot);
    }

    fn apply(&self, snapshot: &BTreeMap<NetworkHandle, Capabilities>) {
        let registrations = self.callbacks.requests();
        for (id, request) in &registrations {
            let current: BTreeSet<NetworkHandle> = snapshot
                .iter()
                .filter(|(_, caps)| request.matches(**caps))
                .map(|(handle, _)| handle.clone())
                .collect();
            let previous = self
                .known()
                .insert(*id, current.clone())
                .unwrap_or_default();

            for event in reconcile(&previous, &current) {
                trace!(callback_id = %id, ?event, "Dispatching network event");
                if !self.callbacks.dispatch_to(*id, event) {
                    break;
                }
            }
        }

        self.known()
            .retain(|id, _| registrations.iter().any(|(live, _)| live == id));
    }
}

impl NetworkPlatform for SystemNetwork {
    fn active_network(&self) -> Option<NetworkHandle> {
        host::default_interface().map(NetworkHandle::new)
    }

    fn capabilities(&self, network: &NetworkHandle) -> Option<Capabilities> {
        let (running, loopback) = host::link(network.as_str())?;
        let default = host::default_interface();
        Some(derive_capabilities(
            running,
            loopback,
            default.as_deref() == Some(network.as_str()),
        ))
    }

    fn register_callback(
        &self,
        request: NetworkRequest,
        callback: NetworkCallback,
    ) -> Result<CallbackId> {
        if self.is_stopped() {
            return Err(Error::callback_register("system network poller is stopped"));
        }
        Ok(self.callbacks.register(request, callback))
    }

    fn unregister_callback(&self, id: CallbackId) -> Result<()> {
        self.known().remove(&id);
        self.callbacks.unregister(id)
    }
}

async fn poll_loop(net: Weak<SystemNetwork>, poll_interval: Duration) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(strong) = net.upgrade() else {
            break;
        };
        if strong.is_stopped() {
            break;
        }

        // Probes shell out on macOS; keep them off the async workers
        if let Err(e) = tokio::task::spawn_blocking(move || strong.poll_once()).await {
            warn!(error = %e, "Network poll failed");
        }
    }

    debug!("System network poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityObserver;

    fn handles(names: &[&str]) -> BTreeSet<NetworkHandle> {
        names.iter().map(|n| NetworkHandle::new(*n)).collect()
    }

    fn internet() -> Capabilities {
        derive_capabilities(true, false, true)
    }

    #[test]
    fn test_derive_capabilities() {
        let caps = derive_capabilities(true, false, true);
        assert!(caps.has(Capability::Internet));
        assert!(caps.has(Capability::Running));

        let caps = derive_capabilities(true, false, false);
        assert!(!caps.has(Capability::Internet));
        assert!(caps.has(Capability::Running));

        let caps = derive_capabilities(false, false, true);
        assert!(!caps.has(Capability::Internet));
        assert!(!caps.has(Capability::Running));
    }

    #[test]
    fn test_derive_capabilities_loopback_never_internet() {
        let caps = derive_capabilities(true, true, true);
        assert!(caps.has(Capability::Loopback));
        assert!(!caps.has(Capability::Internet));
    }

    #[test]
    fn test_reconcile_no_change() {
        let set = handles(&["eth0"]);
        assert!(reconcile(&set, &set).is_empty());
    }

    #[test]
    fn test_reconcile_lost_before_available() {
        let events = reconcile(&handles(&["wlan0"]), &handles(&["eth0"]));
        assert_eq!(
            events,
            vec![
                NetworkEvent::Lost(NetworkHandle::new("wlan0")),
                NetworkEvent::Available(NetworkHandle::new("eth0")),
            ]
        );
    }

    #[test]
    fn test_reconcile_from_empty() {
        let events = reconcile(&BTreeSet::new(), &handles(&["eth0", "wlan0"]));
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, NetworkEvent::Available(_))));
    }

    #[test]
    fn test_apply_dispatches_available_then_lost() {
        let net = SystemNetwork::new(Duration::from_millis(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        net.register_callback(
            NetworkRequest::internet(),
            Arc::new(move |event| seen_cb.lock().unwrap().push(event)),
        )
        .unwrap();

        let mut snapshot = BTreeMap::new();
        snapshot.insert(NetworkHandle::new("eth0"), internet());
        snapshot.insert(NetworkHandle::new("lo"), derive_capabilities(true, true, false));
        net.apply(&snapshot);
        net.apply(&snapshot);
        net.apply(&BTreeMap::new());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                NetworkEvent::Available(NetworkHandle::new("eth0")),
                NetworkEvent::Lost(NetworkHandle::new("eth0")),
            ]
        );
    }

    #[test]
    fn test_apply_respects_request_filter() {
        let net = SystemNetwork::new(Duration::from_millis(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        net.register_callback(
            NetworkRequest::any().require(Capability::Loopback),
            Arc::new(move |event| seen_cb.lock().unwrap().push(event)),
        )
        .unwrap();

        let mut snapshot = BTreeMap::new();
        snapshot.insert(NetworkHandle::new("eth0"), internet());
        snapshot.insert(NetworkHandle::new("lo"), derive_capabilities(true, true, false));
        net.apply(&snapshot);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![NetworkEvent::Available(NetworkHandle::new("lo"))]
        );
    }

    #[test]
    fn test_unregister_forgets_known_networks() {
        let net = SystemNetwork::new(Duration::from_millis(10));
        let id = net
            .register_callback(NetworkRequest::internet(), Arc::new(|_| {}))
            .unwrap();
        let mut snapshot = BTreeMap::new();
        snapshot.insert(NetworkHandle::new("eth0"), internet());
        net.apply(&snapshot);
        assert_eq!(net.known().len(), 1);

        net.unregister_callback(id).unwrap();
        assert!(net.known().is_empty());
        assert!(net.unregister_callback(id).is_err());
    }

    #[test]
    fn test_register_after_stop_fails() {
        let net = SystemNetwork::new(Duration::from_millis(10));
        net.stop();
        let result = net.register_callback(NetworkRequest::internet(), Arc::new(|_| {}));
        assert!(matches!(result, Err(Error::CallbackRegister { .. })));
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        assert!(SystemNetwork::spawn(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_observer_on_system_network_tracks_snapshots() {
        let net = Arc::new(SystemNetwork::new(Duration::from_millis(10)));
        let observer = ConnectivityObserver::new(Arc::clone(&net)).unwrap();

        let mut snapshot = BTreeMap::new();
        snapshot.insert(NetworkHandle::new("eth0"), internet());
        net.apply(&snapshot);
        assert!(observer.is_online());

        drop(observer);
        assert!(net.callbacks.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_and_stop() {
        let net = SystemNetwork::spawn(Duration::from_millis(10)).unwrap();
        assert!(!net.is_stopped());
        net.stop();
        assert!(net.is_stopped());
        assert_eq!(net.poll_interval(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_spawn_rejects_zero_interval() {
        let err = SystemNetwork::spawn(Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_sysfs_default_route_is_internet() {
        use std::fs;
        use tempfile::TempDir;

        let sys = TempDir::new().unwrap();
        for (name, flags, operstate) in [
            ("eth0", "0x1003\n", "up\n"),
            ("docker0", "0x1003\n", "down\n"),
            ("lo", "0x9\n", "unknown\n"),
        ] {
            let dir = sys.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("flags"), flags).unwrap();
            fs::write(dir.join("operstate"), operstate).unwrap();
        }
        let route_table = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
";
        let default = wildex_linux::parse_default_route(route_table);

        let caps: BTreeMap<String, Capabilities> = wildex_linux::list_interfaces_in(sys.path())
            .into_iter()
            .map(|name| {
                let state = wildex_linux::interface_state_in(sys.path(), &name).unwrap();
                let carries_default = default.as_deref() == Some(name.as_str());
                let caps = derive_capabilities(state.running, state.loopback, carries_default);
                (name, caps)
            })
            .collect();

        assert!(caps["eth0"].has(Capability::Internet));
        assert!(caps["eth0"].has(Capability::Running));
        assert!(caps["docker0"].is_empty());
        assert!(caps["lo"].has(Capability::Loopback));
        assert!(!caps["lo"].has(Capability::Internet));
    }

    #[test]
    fn test_platform_name_not_empty() {
        assert!(!platform_name().is_empty());
    }

    #[test]
    fn test_scan_does_not_panic() {
        let net = SystemNetwork::new(Duration::from_secs(1));
        let _ = net.scan();
        let _ = crate::connectivity::probe(&net);
    }
}
