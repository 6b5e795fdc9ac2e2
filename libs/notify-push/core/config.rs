use crate::traits::*;
use std::sync::Arc;

/// Default capacity of the queue between the socket reader and the
/// dispatch thread
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1024;

/// Configuration for PushClient
///
/// Produced by the type-state builder; the capability provider is the only
/// required piece.
pub struct ClientConfig {
    /// Source of the push capability object
    pub(crate) capabilities: Arc<dyn CapabilityProvider>,

    /// Handshake credentials; `None` means the pre-auth token exchange
    pub(crate) auth: Option<Arc<dyn AuthProvider>>,

    /// Optional header provider for the pre-auth POST and the upgrade request
    pub(crate) headers: Option<Arc<dyn HeaderProvider>>,

    /// Reconnection strategy
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Capacity of the dispatch queue
    pub(crate) dispatch_capacity: usize,

    /// Initial value of the online flag
    pub(crate) online: bool,

    /// HTTP client used for the pre-auth exchange
    pub(crate) http: reqwest::Client,
}

impl ClientConfig {
    /// Auth provider to install: the configured one, or the pre-auth
    /// exchange sharing the configured headers
    pub(crate) fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        if let Some(auth) = &self.auth {
            return Arc::clone(auth);
        }
        let exchange = crate::core::pre_auth::PreAuthExchange::new(self.http.clone());
        match &self.headers {
            Some(headers) => Arc::new(exchange.with_headers(Arc::clone(headers))),
            None => Arc::new(exchange),
        }
    }
}
