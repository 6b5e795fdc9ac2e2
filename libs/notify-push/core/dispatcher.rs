//! Inbound frame parsing and the dispatch thread
//!
//! # Architecture
//!
//! ```text
//! Socket reader task ──parse──> Bounded channel ──> Dispatch thread ──> Registry ──> Handlers
//!        │
//!        └── "authenticated" ──> ConnectionManager (resets the error count)
//! ```
//!
//! Handler code only ever runs on the dispatch thread. The reader awaits
//! channel capacity, so a slow handler applies backpressure to the socket
//! instead of growing an unbounded queue.

use crate::core::registry::SubscriptionRegistry;
use crate::traits::{PushError, Result, TopicEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Control frame confirming the handshake
pub const AUTHENTICATED: &str = "authenticated";

/// Prefix of server-side error frames
const SERVER_ERROR_PREFIX: &str = "err: ";

/// A parsed inbound text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Handshake accepted
    Authenticated,
    /// Server reported an error, usually rejected credentials
    ServerError(String),
    /// Event for the topic handlers
    Event(TopicEvent),
}

/// Parse one inbound text frame
///
/// `<topic> <json>` splits at the first space; a bare `<topic>` has no body.
/// A body that is not valid JSON is an error for this frame only.
pub fn parse_frame(text: &str) -> Result<Frame> {
    if text == AUTHENTICATED {
        return Ok(Frame::Authenticated);
    }

    if let Some(message) = text.strip_prefix(SERVER_ERROR_PREFIX) {
        return Ok(Frame::ServerError(message.to_string()));
    }

    let (topic, body) = match text.split_once(' ') {
        Some((topic, body)) => (topic, body),
        None => (text, ""),
    };

    let body = if body.is_empty() {
        None
    } else {
        let value = serde_json::from_str(body).map_err(|e| {
            PushError::Parse(format!("invalid body for topic '{}': {}", topic, e))
        })?;
        Some(value)
    };

    Ok(Frame::Event(TopicEvent::new(topic, body)))
}

/// Spawn the dedicated dispatch thread
///
/// The thread exits once every sender has been dropped and the queue is
/// drained.
pub(crate) fn spawn_dispatcher(
    registry: Arc<SubscriptionRegistry>,
    capacity: usize,
) -> Result<(mpsc::Sender<TopicEvent>, std::thread::JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::channel::<TopicEvent>(capacity.max(1));

    let handle = std::thread::Builder::new()
        .name("notify-push-dispatch".to_string())
        .spawn(move || {
            while let Some(event) = rx.blocking_recv() {
                let invoked = registry.dispatch(&event);
                debug!("Dispatched {} to {} handler(s)", event.topic, invoked);
            }
            debug!("Dispatch channel closed, thread exiting");
        })
        .map_err(|e| PushError::Configuration(format!("failed to spawn dispatch thread: {}", e)))?;

    Ok((tx, handle))
}
