pub mod states;

use crate::core::client::PushClient;
use crate::core::config::{ClientConfig, DEFAULT_DISPATCH_CAPACITY};
use crate::traits::*;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for PushClient
///
/// The capability provider must be set before the client can be built.
/// Everything else has a default: pre-auth token exchange, linear backoff
/// with a one second base, a 1024-slot dispatch queue and online.
pub struct PushClientBuilder<S>
where
    S: CapabilityState,
{
    _state: TypeState<S>,
    capabilities: Option<Arc<dyn CapabilityProvider>>,
    auth: Option<Arc<dyn AuthProvider>>,
    headers: Option<Arc<dyn HeaderProvider>>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    dispatch_capacity: usize,
    online: bool,
    http: Option<reqwest::Client>,
}

impl PushClientBuilder<NoCapabilities> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            capabilities: None,
            auth: None,
            headers: None,
            reconnect_strategy: None,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
            online: true,
            http: None,
        }
    }

    pub fn capabilities(
        self,
        provider: impl CapabilityProvider + 'static,
    ) -> PushClientBuilder<HasCapabilities> {
        PushClientBuilder {
            _state: TypeState::new(),
            capabilities: Some(Arc::new(provider)),
            auth: self.auth,
            headers: self.headers,
            reconnect_strategy: self.reconnect_strategy,
            dispatch_capacity: self.dispatch_capacity,
            online: self.online,
            http: self.http,
        }
    }
}

impl Default for PushClientBuilder<NoCapabilities> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration methods
impl<S> PushClientBuilder<S>
where
    S: CapabilityState,
{
    /// Replace the pre-auth token exchange with a custom auth provider
    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Authenticate every channel with a fixed username/password pair
    pub fn credentials(self, credentials: Credentials) -> Self {
        self.auth(StaticCredentials::new(credentials))
    }

    /// Headers for the pre-auth POST and the WebSocket upgrade request
    pub fn headers(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.headers = Some(Arc::new(provider));
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Shorthand for a linear backoff with the given base interval
    pub fn retry_interval(self, base: Duration) -> Self {
        self.reconnect_strategy(LinearBackoff::new(base))
    }

    /// Capacity of the queue between the socket and the dispatch thread
    pub fn dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    /// Initial value of the online flag
    ///
    /// A client built offline registers topics but does not connect until
    /// `network_online()` is called.
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// HTTP client used for the pre-auth exchange
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

// Build method - only available when the capability provider is set
impl PushClientBuilder<HasCapabilities> {
    /// Build the client and start its dispatch thread
    ///
    /// Must be called from within a tokio runtime; the client spawns its
    /// connection tasks there. No connection is made until the first
    /// `listen`.
    pub async fn build(self) -> Result<PushClient> {
        let capabilities = self.capabilities.ok_or_else(|| {
            PushError::Configuration("capability provider must be set".to_string())
        })?;

        if self.dispatch_capacity == 0 {
            return Err(PushError::Configuration(
                "dispatch_capacity must be greater than zero".to_string(),
            ));
        }

        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(LinearBackoff::default()));

        let config = ClientConfig {
            capabilities,
            auth: self.auth,
            headers: self.headers,
            reconnect_strategy,
            dispatch_capacity: self.dispatch_capacity,
            online: self.online,
            http: self.http.unwrap_or_default(),
        };

        PushClient::new(config)
    }
}
