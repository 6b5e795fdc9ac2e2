use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP headers to send with the pre-auth request and the socket upgrade
pub type Headers = HashMap<String, String>;

/// Trait for providing HTTP headers dynamically
///
/// Called on every connect attempt, both for the pre-auth POST and for
/// the WebSocket upgrade request.
///
/// # Use Cases
/// - Session cookies issued by the web login
/// - CSRF request tokens that rotate
/// - Custom user agents
///
/// # Example
/// ```ignore
/// struct SessionHeaders {
///     cookie: String,
///     request_token: String,
/// }
///
/// #[async_trait::async_trait]
/// impl HeaderProvider for SessionHeaders {
///     async fn get_headers(&self) -> Headers {
///         let mut headers = HashMap::new();
///         headers.insert("Cookie".to_string(), self.cookie.clone());
///         headers.insert("requesttoken".to_string(), self.request_token.clone());
///         headers
///     }
/// }
/// ```
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Generate headers for the next request
    async fn get_headers(&self) -> Headers;
}

/// A no-op header provider that doesn't add any headers
pub struct NoHeaders;

#[async_trait]
impl HeaderProvider for NoHeaders {
    async fn get_headers(&self) -> Headers {
        HashMap::new()
    }
}

/// Header provider serving a fixed set of headers
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: Headers,
}

impl StaticHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn get_headers(&self) -> Headers {
        self.headers.clone()
    }
}
