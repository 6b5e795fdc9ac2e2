//! # notify-push
//!
//! Client for a notify_push style server: one persistent WebSocket push
//! channel carrying every topic subscription of the process.
//!
//! ## Features
//!
//! - **Single channel**: at most one socket or connect attempt at any time
//! - **Replay on reconnect**: every registered topic is resubscribed after each (re)connect
//! - **Linear backoff**: retry delay grows with the consecutive error count
//! - **Online/offline edges**: the host drives connectivity, the client follows
//! - **Off-socket dispatch**: handlers run on a dedicated thread behind a bounded queue
//!
//! ## Example
//!
//! ```rust,ignore
//! use notify_push::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let http = reqwest::Client::new();
//!     let caps = discover_capabilities(&http, "https://cloud.example", Some(&creds)).await?;
//!
//!     let client = notify_push::builder()
//!         .capabilities(StaticCapabilities::new(caps))
//!         .credentials(creds)
//!         .build()
//!         .await?;
//!
//!     client.listen("notify_file", |event: &TopicEvent| {
//!         println!("Event: {:?}", event);
//!     });
//!
//!     client.shutdown().await
//! }
//! ```

pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder,
    builder::{states, PushClientBuilder},
    client::PushClient,
    config::{ClientConfig, DEFAULT_DISPATCH_CAPACITY},
    discovery::{discover_capabilities, parse_capabilities_document, CAPABILITIES_PATH},
    dispatcher::{parse_frame, Frame},
    pre_auth::PreAuthExchange,
    registry::SubscriptionRegistry,
    state_machine::{is_valid_topic, subscribe_frame, Action, ChannelSink, ConnectionManager, ConnectionState},
};
