//! Network connectivity observation.
//!
//! A [`NetworkPlatform`] reports the active network and its capabilities
//! synchronously and delivers [`NetworkEvent`]s asynchronously to registered
//! callbacks. [`ConnectivityObserver`] folds those into a single observable
//! "online" cell that fails closed: any uncertainty reads as offline.

mod memory;
mod observer;
mod registry;
mod system;

use std::sync::Arc;

pub use memory::MemoryNetwork;
pub use observer::ConnectivityObserver;
pub use registry::CallbackRegistry;
pub use system::{derive_capabilities, platform_name, reconcile, SystemNetwork};

use crate::error::Result;

/// Opaque identifier of a platform network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkHandle(String);

impl NetworkHandle {
    /// Wrap a platform identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The platform identifier (an interface name for [`SystemNetwork`]).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A platform-reported attribute of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The network can reach the internet.
    Internet,
    /// The link is up and passing traffic.
    Running,
    /// The network is the local loopback.
    Loopback,
}

impl Capability {
    /// Every capability, in bit order.
    pub const ALL: [Self; 3] = [Self::Internet, Self::Running, Self::Loopback];

    const fn bit(self) -> u8 {
        match self {
            Self::Internet => 1 << 0,
            Self::Running => 1 << 1,
            Self::Loopback => 1 << 2,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internet => write!(f, "internet"),
            Self::Running => write!(f, "running"),
            Self::Loopback => write!(f, "loopback"),
        }
    }
}

/// Set of [`Capability`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Copy with `capability` added.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Whether `capability` is in the set.
    #[must_use]
    pub const fn has(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Whether every capability in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Capabilities in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.has(*c))
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        for (i, capability) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{capability}")?;
        }
        Ok(())
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Capability filter for a callback registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkRequest {
    required: Capabilities,
}

impl NetworkRequest {
    /// A request matching any network.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            required: Capabilities::empty(),
        }
    }

    /// A request matching internet-capable networks.
    #[must_use]
    pub const fn internet() -> Self {
        Self::any().require(Capability::Internet)
    }

    /// Copy that additionally requires `capability`.
    #[must_use]
    pub const fn require(self, capability: Capability) -> Self {
        Self {
            required: self.required.with(capability),
        }
    }

    /// Capabilities a network must have to match.
    #[must_use]
    pub const fn required(&self) -> Capabilities {
        self.required
    }

    /// Whether a network with `capabilities` satisfies this request.
    #[must_use]
    pub const fn matches(&self, capabilities: Capabilities) -> bool {
        capabilities.contains(self.required)
    }
}

/// A network lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A network matching the request became available.
    Available(NetworkHandle),
    /// A previously available network was lost.
    Lost(NetworkHandle),
}

impl NetworkEvent {
    /// The network this event is about.
    #[must_use]
    pub fn network(&self) -> &NetworkHandle {
        match self {
            Self::Available(handle) | Self::Lost(handle) => handle,
        }
    }
}

/// Identifier returned by [`NetworkPlatform::register_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub u64);

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked on the platform's delivery context.
pub type NetworkCallback = Arc<dyn Fn(NetworkEvent) + Send + Sync>;

/// The host's network-management subsystem.
///
/// `active_network` and `capabilities` are synchronous local queries. Events
/// are delivered to callbacks on a context chosen by the implementation.
pub trait NetworkPlatform: Send + Sync {
    /// The network the system currently routes default traffic through.
    fn active_network(&self) -> Option<NetworkHandle>;

    /// Capabilities of `network`, or `None` if the platform no longer knows it.
    fn capabilities(&self, network: &NetworkHandle) -> Option<Capabilities>;

    /// Subscribe `callback` to events for networks matching `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the registration.
    fn register_callback(
        &self,
        request: NetworkRequest,
        callback: NetworkCallback,
    ) -> Result<CallbackId>;

    /// Remove a registration.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not registered.
    fn unregister_callback(&self, id: CallbackId) -> Result<()>;
}

/// Whether the active network is internet-capable.
///
/// No active network, or no capability metadata for it, reads as `false`.
pub fn probe<P: NetworkPlatform + ?Sized>(platform: &P) -> bool {
    let Some(network) = platform.active_network() else {
        return false;
    };
    platform
        .capabilities(&network)
        .is_some_and(|caps| caps.has(Capability::Internet))
}
