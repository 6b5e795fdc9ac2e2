//! # notify-push traits
//!
//! Seams between the connection core and its collaborators:
//!
//! - **AuthProvider**: produce the handshake credentials for an attempt
//! - **CapabilityProvider**: report whether push is offered, and where
//! - **HeaderProvider**: extra HTTP headers for pre-auth and socket upgrade
//! - **ReconnectionStrategy**: delay before the next attempt
//! - **TopicHandler**: consume parsed events

pub mod auth;
pub mod capabilities;
pub mod error;
pub mod handler;
pub mod headers;
pub mod reconnect;

// Re-export commonly used types
pub use auth::{AuthProvider, Credentials, PendingAuth, StaticCredentials};
pub use capabilities::{
    CapabilityProvider, PushCapabilities, PushEndpoints, SharedCapabilities, StaticCapabilities,
};
pub use error::{PushError, Result};
pub use handler::{ListenOptions, TopicEvent, TopicHandler};
pub use headers::{HeaderProvider, Headers, NoHeaders, StaticHeaders};
pub use reconnect::{LinearBackoff, NeverReconnect, ReconnectionStrategy, DEFAULT_RETRY_INTERVAL};
