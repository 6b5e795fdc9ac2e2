pub mod builder;
pub mod channel;
pub mod client;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod pre_auth;
pub mod registry;
pub mod state_machine;

/// Create a new client builder
///
/// # Example
/// ```ignore
/// let client = notify_push::builder()
///     .capabilities(StaticCapabilities::new(caps))
///     .headers(StaticHeaders::new().with("Cookie", session_cookie))
///     .build()
///     .await?;
/// ```
pub fn builder() -> builder::PushClientBuilder<builder::states::NoCapabilities> {
    builder::PushClientBuilder::new()
}
