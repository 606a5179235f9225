//! Callback bookkeeping shared by platform implementations.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::{Capabilities, CallbackId, NetworkCallback, NetworkEvent, NetworkRequest};
use crate::error::{Error, Result};

struct Registration {
    request: NetworkRequest,
    callback: NetworkCallback,
}

/// Registered network callbacks, keyed by [`CallbackId`].
///
/// Dispatch clones the callbacks out before invoking them, so a callback may
/// register or unregister without deadlocking.
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: AtomicU64,
    entries: Mutex<BTreeMap<CallbackId, Registration>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered", &self.len())
            .finish_non_exhaustive()
    }
}

impl CallbackRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<CallbackId, Registration>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a registration and return its id.
    pub fn register(&self, request: NetworkRequest, callback: NetworkCallback) -> CallbackId {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries()
            .insert(id, Registration { request, callback });
        trace!(%id, "Registered network callback");
        id
    }

    /// Remove a registration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallbackNotRegistered`] if `id` is unknown.
    pub fn unregister(&self, id: CallbackId) -> Result<()> {
        match self.entries().remove(&id) {
            Some(_) => {
                trace!(%id, "Unregistered network callback");
                Ok(())
            }
            None => Err(Error::CallbackNotRegistered { id: id.0 }),
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Ids and requests of all registrations, in registration order.
    #[must_use]
    pub fn requests(&self) -> Vec<(CallbackId, NetworkRequest)> {
        self.entries()
            .iter()
            .map(|(id, reg)| (*id, reg.request))
            .collect()
    }

    /// Deliver `event` to one registration. Returns `false` if it is gone.
    pub fn dispatch_to(&self, id: CallbackId, event: NetworkEvent) -> bool {
        let callback = self.entries().get(&id).map(|reg| reg.callback.clone());
        match callback {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to registrations whose request `capabilities` satisfies.
    pub fn dispatch_matching(&self, event: &NetworkEvent, capabilities: Capabilities) {
        let callbacks: Vec<NetworkCallback> = self
            .entries()
            .values()
            .filter(|reg| reg.request.matches(capabilities))
            .map(|reg| reg.callback.clone())
            .collect();
        for callback in callbacks {
            callback(event.clone());
        }
    }

    /// Deliver `event` to every registration.
    pub fn dispatch_all(&self, event: &NetworkEvent) {
        let callbacks: Vec<NetworkCallback> = self
            .entries()
            .values()
            .map(|reg| reg.callback.clone())
            .collect();
        for callback in callbacks {
            callback(event.clone());
        }
    }
}
