//! Scriptable in-process network platform.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    Capabilities, Capability, CallbackId, CallbackRegistry, NetworkCallback, NetworkEvent,
    NetworkHandle, NetworkPlatform, NetworkRequest,
};
use crate::error::Result;

#[derive(Debug, Default)]
struct State {
    active: Option<NetworkHandle>,
    capabilities: HashMap<NetworkHandle, Capabilities>,
}

/// A [`NetworkPlatform`] whose state is set by hand.
///
/// Events are delivered synchronously on the calling thread. [`Self::publish`]
/// honours each registration's [`NetworkRequest`]; [`Self::emit`] injects an
/// event into every registration unfiltered.
#[derive(Debug, Default)]
pub struct MemoryNetwork {
    state: Mutex<State>,
    callbacks: CallbackRegistry,
}

impl MemoryNetwork {
    /// A platform with no networks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform whose active network `name` is internet-capable.
    #[must_use]
    pub fn connected(name: &str) -> Self {
        let net = Self::new();
        let handle = NetworkHandle::new(name);
        net.set_capabilities(
            &handle,
            Capabilities::empty()
                .with(Capability::Internet)
                .with(Capability::Running),
        );
        net.set_active(Some(handle));
        net
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the active network without emitting an event.
    pub fn set_active(&self, network: Option<NetworkHandle>) {
        self.state().active = network;
    }

    /// Set the capabilities reported for `network`.
    pub fn set_capabilities(&self, network: &NetworkHandle, capabilities: Capabilities) {
        self.state()
            .capabilities
            .insert(network.clone(), capabilities);
    }

    /// Forget `network`: its capabilities read as unavailable afterwards.
    pub fn forget(&self, network: &NetworkHandle) {
        let mut state = self.state();
        state.capabilities.remove(network);
        if state.active.as_ref() == Some(network) {
            state.active = None;
        }
    }

    /// Deliver `event` to all registered callbacks, ignoring their requests.
    pub fn emit(&self, event: &NetworkEvent) {
        self.callbacks.dispatch_all(event);
    }

    /// Deliver `event` the way a platform would.
    ///
    /// `Available` reaches registrations whose request matches the network's
    /// current capabilities; a network with none set reaches only
    /// [`NetworkRequest::any`]. `Lost` reaches every registration.
    pub fn publish(&self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Available(network) => {
                let capabilities = self.capabilities(network).unwrap_or_default();
                self.callbacks.dispatch_matching(event, capabilities);
            }
            NetworkEvent::Lost(_) => self.callbacks.dispatch_all(event),
        }
    }

    /// Number of live callback registrations.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }
}

impl NetworkPlatform for MemoryNetwork {
    fn active_network(&self) -> Option<NetworkHandle> {
        self.state().active.clone()
    }

    fn capabilities(&self, network: &NetworkHandle) -> Option<Capabilities> {
        self.state().capabilities.get(network).copied()
    }

    fn register_callback(
        &self,
        request: NetworkRequest,
        callback: NetworkCallback,
    ) -> Result<CallbackId> {
        Ok(self.callbacks.register(request, callback))
    }

    fn unregister_callback(&self, id: CallbackId) -> Result<()> {
        self.callbacks.unregister(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_new_is_disconnected() {
        let net = MemoryNetwork::new();
        assert!(net.active_network().is_none());
        assert_eq!(net.callback_count(), 0);
    }

    #[test]
    fn test_connected() {
        let net = MemoryNetwork::connected("wlan0");
        let active = net.active_network().unwrap();
        assert_eq!(active.as_str(), "wlan0");
        assert!(net.capabilities(&active).unwrap().has(Capability::Internet));
    }

    #[test]
    fn test_forget_clears_active() {
        let net = MemoryNetwork::connected("wlan0");
        let wlan = NetworkHandle::new("wlan0");
        net.forget(&wlan);
        assert!(net.active_network().is_none());
        assert!(net.capabilities(&wlan).is_none());
    }

    #[test]
    fn test_emit_reaches_callbacks() {
        let net = MemoryNetwork::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = Arc::clone(&seen);
        let id = net
            .register_callback(
                NetworkRequest::internet(),
                Arc::new(move |_event| {
                    seen_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        net.emit(&NetworkEvent::Available(NetworkHandle::new("eth0")));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        net.unregister_callback(id).unwrap();
        net.emit(&NetworkEvent::Lost(NetworkHandle::new("eth0")));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_honours_request_filter() {
        let net = MemoryNetwork::new();
        let internet_seen = Arc::new(AtomicUsize::new(0));
        let any_seen = Arc::new(AtomicUsize::new(0));
        for (request, counter) in [
            (NetworkRequest::internet(), Arc::clone(&internet_seen)),
            (NetworkRequest::any(), Arc::clone(&any_seen)),
        ] {
            net.register_callback(
                request,
                Arc::new(move |_event| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        }

        let lan = NetworkHandle::new("eth1");
        net.set_capabilities(&lan, Capabilities::empty().with(Capability::Running));
        net.publish(&NetworkEvent::Available(lan.clone()));
        assert_eq!(internet_seen.load(Ordering::SeqCst), 0);
        assert_eq!(any_seen.load(Ordering::SeqCst), 1);

        let wlan = NetworkHandle::new("wlan0");
        net.set_capabilities(&wlan, Capabilities::empty().with(Capability::Internet));
        net.publish(&NetworkEvent::Available(wlan));
        assert_eq!(internet_seen.load(Ordering::SeqCst), 1);
        assert_eq!(any_seen.load(Ordering::SeqCst), 2);

        net.publish(&NetworkEvent::Lost(lan));
        assert_eq!(internet_seen.load(Ordering::SeqCst), 2);
        assert_eq!(any_seen.load(Ordering::SeqCst), 3);
    }
}
