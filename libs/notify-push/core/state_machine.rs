//! Connection lifecycle state machine
//!
//! ```text
//!            listen / retry / online
//!   Idle ───────────────────────────> Connecting ──socket open──> Open
//!    ^  <── no capabilities ──────────┘    │                        │
//!    │                                     │ pre-auth/connect fail  │ error / close
//!    │                                     v                        v
//!    └──────── offline (any state) ──── Closed <────────────────────┘
//!                                          │
//!                                          └── retry after error_count × base
//! ```
//!
//! The machine performs no I/O. Each event returns the [`Action`]s the
//! caller must carry out (start a connect attempt, schedule or cancel the
//! retry timer). Frames are written through the [`ChannelSink`] stored in
//! the `Open` slot, so the handshake and subscription replay happen in the
//! same transition that marks the channel open.

use crate::core::registry::SubscriptionRegistry;
use crate::traits::{
    CapabilityProvider, PendingAuth, PushCapabilities, ReconnectionStrategy, TopicHandler,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Write side of an open channel
pub trait ChannelSink: Send {
    /// Queue one text frame; `false` when the channel is already gone
    fn send_text(&self, frame: String) -> bool;

    /// Tear the channel down without sending a close frame
    fn close(&self);
}

/// Public view of the connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel and no pending retry
    Idle,
    /// Connect attempt in flight, the slot is occupied
    Connecting,
    /// Channel open, handshake and subscriptions sent
    Open,
    /// Channel lost, a retry may be pending
    Closed,
}

enum Slot<C> {
    Idle,
    Connecting { generation: u64 },
    Open { generation: u64, channel: C },
    Closed,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start connect attempt `generation` against these endpoints
    Connect {
        generation: u64,
        capabilities: PushCapabilities,
    },
    /// Arm the retry timer, replacing any pending one
    ScheduleRetry { delay: Duration },
    /// Disarm the retry timer
    CancelRetry,
}

/// Owner of the single channel slot and the error counter
pub struct ConnectionManager<C> {
    slot: Slot<C>,
    error_count: u32,
    online: bool,
    available: bool,
    shut_down: bool,
    next_generation: u64,
    registry: Arc<SubscriptionRegistry>,
    capabilities: Arc<dyn CapabilityProvider>,
    strategy: Box<dyn ReconnectionStrategy>,
}

impl<C: ChannelSink> ConnectionManager<C> {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        capabilities: Arc<dyn CapabilityProvider>,
        strategy: Box<dyn ReconnectionStrategy>,
        online: bool,
    ) -> Self {
        Self {
            slot: Slot::Idle,
            error_count: 0,
            online,
            available: false,
            shut_down: false,
            next_generation: 0,
            registry,
            capabilities,
            strategy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.slot {
            Slot::Idle => ConnectionState::Idle,
            Slot::Connecting { .. } => ConnectionState::Connecting,
            Slot::Open { .. } => ConnectionState::Open,
            Slot::Closed => ConnectionState::Closed,
        }
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Generation of the attempt or channel occupying the slot
    fn current_generation(&self) -> Option<u64> {
        match self.slot {
            Slot::Connecting { generation } | Slot::Open { generation, .. } => Some(generation),
            Slot::Idle | Slot::Closed => None,
        }
    }

    /// Register a handler and make sure a channel is on its way
    ///
    /// Returns the availability snapshot and the actions to run. A topic
    /// registered while the channel is open is subscribed immediately;
    /// otherwise the replay on open covers it.
    ///
    /// A topic that cannot be framed (empty or containing a space) is not
    /// registered and reports `false`.
    pub fn listen(&mut self, topic: &str, handler: Arc<dyn TopicHandler>) -> (bool, Vec<Action>) {
        if !is_valid_topic(topic) {
            warn!("Ignoring listen on invalid topic '{}'", topic);
            return (false, Vec::new());
        }

        let created = self.registry.register(topic, handler);

        if created {
            if let Slot::Open { channel, .. } = &self.slot {
                debug!("Subscribing to new topic {} on open channel", topic);
                if !channel.send_text(subscribe_frame(topic)) {
                    warn!("Channel gone while subscribing to {}", topic);
                }
            }
        }

        let actions = self.ensure_connected();
        (self.available, actions)
    }

    /// Occupy the slot and request a connect attempt, unless one exists
    pub fn ensure_connected(&mut self) -> Vec<Action> {
        if self.shut_down {
            return Vec::new();
        }

        if self.current_generation().is_some() {
            return Vec::new();
        }

        if !self.online {
            debug!("Network offline, deferring connect until online");
            return Vec::new();
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.slot = Slot::Connecting { generation };

        match self.capabilities.capabilities() {
            Some(capabilities) => {
                self.available = true;
                debug!("Starting connect attempt {}", generation);
                vec![Action::Connect {
                    generation,
                    capabilities,
                }]
            }
            None => {
                warn!("Push is not supported by the server, not connecting");
                self.available = false;
                self.slot = Slot::Idle;
                Vec::new()
            }
        }
    }

    /// The socket for `generation` opened
    ///
    /// Sends the handshake frames and one `listen` per registered topic,
    /// then marks the channel open. A stale generation hands the channel
    /// back so the caller can drop it.
    pub fn socket_opened(
        &mut self,
        generation: u64,
        channel: C,
        auth: PendingAuth,
    ) -> std::result::Result<(), C> {
        let expected = matches!(self.slot, Slot::Connecting { generation: g } if g == generation);
        if !expected || self.shut_down {
            debug!("Discarding socket from stale attempt {}", generation);
            return Err(channel);
        }

        let mut delivered = true;
        for frame in auth.into_frames() {
            delivered &= channel.send_text(frame);
        }

        let topics = self.registry.topics();
        for topic in &topics {
            delivered &= channel.send_text(subscribe_frame(topic));
        }

        if !delivered {
            warn!("Channel closed during handshake of attempt {}", generation);
        }

        info!(
            "Push channel open (attempt {}, {} topic(s))",
            generation,
            topics.len()
        );
        self.slot = Slot::Open {
            generation,
            channel,
        };
        Ok(())
    }

    /// The server confirmed the handshake on `generation`
    pub fn authenticated(&mut self, generation: u64) {
        if self.current_generation() == Some(generation) {
            info!("Push channel authenticated");
            self.error_count = 0;
        }
    }

    /// The attempt or channel `generation` failed
    ///
    /// Covers socket error, socket close, failed socket open and failed
    /// pre-auth exchange alike.
    pub fn connection_failed(&mut self, generation: u64) -> Vec<Action> {
        if self.current_generation() != Some(generation) {
            return Vec::new();
        }

        if let Slot::Open { channel, .. } = std::mem::replace(&mut self.slot, Slot::Closed) {
            channel.close();
        }

        self.error_count = self.error_count.saturating_add(1);

        if self.shut_down || !self.online {
            debug!("Not scheduling a retry (offline or shut down)");
            return Vec::new();
        }

        match self.strategy.next_delay(self.error_count) {
            Some(delay) => {
                info!(
                    "Push channel lost, retrying in {:?} (error count {})",
                    delay, self.error_count
                );
                vec![Action::ScheduleRetry { delay }]
            }
            None => {
                warn!("Reconnection strategy gave up after {} error(s)", self.error_count);
                Vec::new()
            }
        }
    }

    /// The retry timer fired
    pub fn retry_fired(&mut self) -> Vec<Action> {
        if !self.online {
            debug!("Retry fired while offline, ignoring");
            return Vec::new();
        }
        self.ensure_connected()
    }

    /// External "network online" edge
    pub fn network_online(&mut self) -> Vec<Action> {
        info!("Network online");
        self.online = true;
        self.error_count = 0;

        let mut actions = vec![Action::CancelRetry];
        if !self.registry.is_empty() {
            actions.extend(self.ensure_connected());
        }
        actions
    }

    /// External "network offline" edge
    pub fn network_offline(&mut self) -> Vec<Action> {
        info!("Network offline, dropping push channel");
        self.online = false;
        self.clear_slot();
        vec![Action::CancelRetry]
    }

    /// Stop for good: drop the channel and refuse further attempts
    pub fn shutdown(&mut self) -> Vec<Action> {
        self.shut_down = true;
        self.clear_slot();
        vec![Action::CancelRetry]
    }

    fn clear_slot(&mut self) {
        if let Slot::Open { channel, .. } = std::mem::replace(&mut self.slot, Slot::Idle) {
            channel.close();
        }
    }
}

/// Whether `topic` survives the `listen <topic>` / `<topic> <json>` framing
pub fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(char::is_whitespace)
}

/// Subscribe command for one topic
pub fn subscribe_frame(topic: &str) -> String {
    format!("listen {}", topic)
}
