use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The two endpoints advertised by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEndpoints {
    /// WebSocket URL of the push channel
    pub websocket: String,
    /// URL receiving the pre-auth POST
    pub pre_auth: String,
}

/// The server's push capability object
///
/// Its absence means the server does not offer push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCapabilities {
    /// Event type names the server can push
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    pub endpoints: PushEndpoints,
}

/// Source of the push capability object
///
/// Reads are synchronous and must not hit the network; discovery happens
/// beforehand (see `discover_capabilities`).
pub trait CapabilityProvider: Send + Sync {
    /// Current capabilities, or `None` when push is unsupported
    fn capabilities(&self) -> Option<PushCapabilities>;
}

/// Capability provider fixed at construction
#[derive(Debug, Clone)]
pub struct StaticCapabilities {
    capabilities: Option<PushCapabilities>,
}

impl StaticCapabilities {
    pub fn new(capabilities: Option<PushCapabilities>) -> Self {
        Self { capabilities }
    }

    /// Provider reporting that push is unsupported
    pub fn unsupported() -> Self {
        Self { capabilities: None }
    }
}

impl CapabilityProvider for StaticCapabilities {
    fn capabilities(&self) -> Option<PushCapabilities> {
        self.capabilities.clone()
    }
}

/// Capability provider that can be refreshed while the client runs
///
/// Clones share the same slot, so the host can keep one handle and update
/// it after a new discovery round.
#[derive(Debug, Clone, Default)]
pub struct SharedCapabilities {
    inner: Arc<RwLock<Option<PushCapabilities>>>,
}

impl SharedCapabilities {
    pub fn new(capabilities: Option<PushCapabilities>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(capabilities)),
        }
    }

    /// Replace the advertised capabilities
    pub fn set(&self, capabilities: Option<PushCapabilities>) {
        *self.inner.write() = capabilities;
    }
}

impl CapabilityProvider for SharedCapabilities {
    fn capabilities(&self) -> Option<PushCapabilities> {
        self.inner.read().clone()
    }
}
