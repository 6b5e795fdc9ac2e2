//! Topic handlers
//!
//! Handlers are registered per topic and invoked on the dispatch thread,
//! never on the socket task.
//!
//! # Ordering Guarantees
//!
//! - **Per-topic sequential**: handlers for a topic run in registration order
//! - **Arrival order**: events are delivered in the order frames arrived
//! - **No batching**: every frame yields exactly one invocation per handler

use crate::Result;
use serde_json::Value;

/// One inbound event after frame parsing
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEvent {
    pub topic: String,
    /// Parsed JSON body, `None` when the frame carried only a topic
    pub body: Option<Value>,
}

impl TopicEvent {
    pub fn new(topic: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            topic: topic.into(),
            body,
        }
    }
}

/// Handler invoked for every event on the topics it was registered for
///
/// Any `Fn(&TopicEvent)` closure is a handler.
///
/// # Example
///
/// ```ignore
/// struct FileChangeHandler {
///     changes: Arc<AtomicU64>,
/// }
///
/// impl TopicHandler for FileChangeHandler {
///     fn handle(&self, event: &TopicEvent) -> Result<()> {
///         self.changes.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
pub trait TopicHandler: Send + Sync + 'static {
    /// Handle one event
    ///
    /// # Errors
    /// If this returns an error, it is logged and the remaining handlers
    /// for the topic still run.
    fn handle(&self, event: &TopicEvent) -> Result<()>;
}

impl<F> TopicHandler for F
where
    F: Fn(&TopicEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: &TopicEvent) -> Result<()> {
        self(event);
        Ok(())
    }
}

/// Per-call options for `listen`
#[derive(Debug, Clone, Default)]
pub struct ListenOptions {
    /// Static credentials to authenticate with instead of the pre-auth token
    pub credentials: Option<crate::Credentials>,
}

impl ListenOptions {
    pub fn with_credentials(credentials: crate::Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}
