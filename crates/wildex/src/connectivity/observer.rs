//! The observable "online" cell.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{probe, CallbackId, NetworkCallback, NetworkEvent, NetworkPlatform, NetworkRequest};
use crate::error::{Error, Result};

/// Tracks whether the device currently has internet-capable network access.
///
/// The initial value comes from a synchronous [`probe`] at construction. After
/// that the platform callback drives it:
/// - `Available` sets the cell to `true` without re-probing.
/// - `Lost` re-probes, so losing one network while another usable one stays
///   active keeps the cell `true`.
///
/// The callback is unregistered by [`close`](Self::close) or on drop.
pub struct ConnectivityObserver<P: NetworkPlatform + ?Sized + 'static = dyn NetworkPlatform> {
    platform: Arc<P>,
    state: Arc<watch::Sender<bool>>,
    callback_id: Option<CallbackId>,
}

impl<P: NetworkPlatform + ?Sized + 'static> std::fmt::Debug for ConnectivityObserver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityObserver")
            .field("online", &self.is_online())
            .field("callback_id", &self.callback_id)
            .finish_non_exhaustive()
    }
}

impl<P: NetworkPlatform + ?Sized + 'static> ConnectivityObserver<P> {
    /// Probe the platform and subscribe to internet-capable network events.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the callback registration.
    pub fn new(platform: Arc<P>) -> Result<Self> {
        let initial = probe(&*platform);
        let (sender, _) = watch::channel(initial);
        let state = Arc::new(sender);

        let callback = event_callback(Arc::downgrade(&platform), Arc::clone(&state));
        let callback_id = platform.register_callback(NetworkRequest::internet(), callback)?;
        info!(online = initial, %callback_id, "Connectivity observer started");

        Ok(Self {
            platform,
            state,
            callback_id: Some(callback_id),
        })
    }

    /// Current value of the cell.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// A new receiver that is notified on every online/offline transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Resolve once the cell equals `online`. Returns immediately if it already does.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell was torn down while waiting.
    pub async fn wait_for(&self, online: bool) -> Result<()> {
        let mut rx = self.subscribe();
        rx.wait_for(|value| *value == online)
            .await
            .map(|_| ())
            .map_err(|_| Error::internal("connectivity state closed"))
    }

    /// The platform this observer reads from.
    #[must_use]
    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    /// Unregister the platform callback. The cell keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform fails to unregister the callback.
    pub fn close(mut self) -> Result<()> {
        match self.callback_id.take() {
            Some(id) => self.platform.unregister_callback(id),
            None => Ok(()),
        }
    }
}

impl<P: NetworkPlatform + ?Sized + 'static> Drop for ConnectivityObserver<P> {
    fn drop(&mut self) {
        if let Some(id) = self.callback_id.take() {
            if let Err(e) = self.platform.unregister_callback(id) {
                warn!(error = %e, callback_id = %id, "Failed to unregister network callback");
            } else {
                debug!(callback_id = %id, "Connectivity observer stopped");
            }
        }
    }
}

/// Build the platform callback. Holds the platform weakly so a platform that
/// owns its callbacks never keeps itself alive.
fn event_callback<P: NetworkPlatform + ?Sized + 'static>(
    platform: Weak<P>,
    state: Arc<watch::Sender<bool>>,
) -> NetworkCallback {
    Arc::new(move |event: NetworkEvent| {
        let online = match &event {
            NetworkEvent::Available(_) => true,
            NetworkEvent::Lost(_) => platform.upgrade().is_some_and(|p| probe(&*p)),
        };
        let changed = state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            debug!(online, network = %event.network(), "Connectivity changed");
        }
    })
}
