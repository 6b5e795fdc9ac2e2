//! Topic → handler registry
//!
//! Source of truth for which topics are subscribed; replayed on every
//! (re)connect. Topics are never removed.

use crate::traits::{TopicEvent, TopicHandler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Default)]
struct Subscriptions {
    /// Topics in first-registration order
    order: Vec<String>,
    handlers: HashMap<String, Vec<Arc<dyn TopicHandler>>>,
}

/// Registry of topic subscriptions
#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<Subscriptions>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the topic's handler list
    ///
    /// Returns `true` when this call created the topic. Registering the
    /// same handler twice makes it run twice per event.
    pub fn register(&self, topic: &str, handler: Arc<dyn TopicHandler>) -> bool {
        let mut inner = self.inner.write();
        match inner.handlers.get_mut(topic) {
            Some(list) => {
                list.push(handler);
                false
            }
            None => {
                inner.handlers.insert(topic.to_string(), vec![handler]);
                inner.order.push(topic.to_string());
                true
            }
        }
    }

    /// Registered topic names in first-registration order
    pub fn topics(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.inner.read().handlers.contains_key(topic)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().order.is_empty()
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.inner
            .read()
            .handlers
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Invoke every handler registered for the event's topic, in order
    ///
    /// Handlers run outside the registry lock, so a handler may call
    /// `register` itself. A panicking handler is logged and the next one
    /// still runs. Returns the number of handlers invoked; unknown topics
    /// are dropped.
    pub fn dispatch(&self, event: &TopicEvent) -> usize {
        let handlers = match self.inner.read().handlers.get(&event.topic) {
            Some(list) => list.clone(),
            None => {
                debug!("No handler registered for topic: {}", event.topic);
                return 0;
            }
        };

        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Handler error for topic {}: {}", event.topic, e),
                Err(panic) => error!(
                    "Handler panicked for topic {}: {}",
                    event.topic,
                    panic_message(panic.as_ref())
                ),
            }
        }

        handlers.len()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
