use crate::core::builder::states::NoCapabilities;
use crate::core::builder::PushClientBuilder;
use crate::core::channel::{build_request, open_socket, read_loop, ReadOutcome, SocketChannel};
use crate::core::config::ClientConfig;
use crate::core::dispatcher::spawn_dispatcher;
use crate::core::registry::SubscriptionRegistry;
use crate::core::state_machine::{Action, ConnectionManager, ConnectionState};
use crate::traits::*;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Push notification client
///
/// Keeps at most one channel to the push server and multiplexes every
/// topic subscription over it. Handlers run on a dedicated dispatch
/// thread; the socket tasks live on the tokio runtime the client was
/// built on.
///
/// Cloning is cheap and every clone drives the same connection.
///
/// # Example
/// ```ignore
/// let client = notify_push::builder()
///     .capabilities(StaticCapabilities::new(caps))
///     .build()
///     .await?;
///
/// client.listen("notify_file", |event: &TopicEvent| {
///     println!("file changed: {:?}", event.body);
/// });
/// ```
#[derive(Clone)]
pub struct PushClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    machine: Mutex<ConnectionManager<SocketChannel>>,
    registry: Arc<SubscriptionRegistry>,
    capabilities: Arc<dyn CapabilityProvider>,
    auth: RwLock<Arc<dyn AuthProvider>>,
    headers: Option<Arc<dyn HeaderProvider>>,
    /// Pending retry timer; at most one
    retry: Mutex<Option<JoinHandle<()>>>,
    /// Sender side of the dispatch queue, dropped on shutdown
    dispatch_tx: Mutex<Option<mpsc::Sender<TopicEvent>>>,
    dispatch_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    runtime: Handle,
}

impl PushClient {
    /// Create a new client builder
    pub fn builder() -> PushClientBuilder<NoCapabilities> {
        PushClientBuilder::new()
    }

    /// Create a new client from configuration
    ///
    /// This is called by the builder's `build()` method.
    /// Use `notify_push::builder()` to create a client.
    pub(crate) fn new(config: ClientConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            PushError::Configuration(format!("client must be built inside a tokio runtime: {}", e))
        })?;

        let auth = config.auth_provider();
        let ClientConfig {
            capabilities,
            headers,
            reconnect_strategy,
            dispatch_capacity,
            online,
            ..
        } = config;

        let registry = Arc::new(SubscriptionRegistry::new());
        let (dispatch_tx, dispatch_thread) =
            spawn_dispatcher(Arc::clone(&registry), dispatch_capacity)?;

        let machine = ConnectionManager::new(
            Arc::clone(&registry),
            Arc::clone(&capabilities),
            reconnect_strategy,
            online,
        );

        debug!(
            "Push client created (online: {}, dispatch capacity: {})",
            online, dispatch_capacity
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                machine: Mutex::new(machine),
                registry,
                capabilities,
                auth: RwLock::new(auth),
                headers,
                retry: Mutex::new(None),
                dispatch_tx: Mutex::new(Some(dispatch_tx)),
                dispatch_thread: Mutex::new(Some(dispatch_thread)),
                runtime,
            }),
        })
    }

    /// Event types the server advertises; empty when push is unsupported
    pub fn supported_types(&self) -> Vec<String> {
        self.inner
            .capabilities
            .capabilities()
            .map(|caps| caps.types)
            .unwrap_or_default()
    }

    /// Register `handler` for `topic` and make sure a channel is on its way
    ///
    /// Returns whether push is available as far as the client knows right
    /// now. The very first call on a client that never saw capabilities
    /// returns `false` if the capability provider has nothing. The handler
    /// stays registered either way.
    pub fn listen<H>(&self, topic: &str, handler: H) -> bool
    where
        H: TopicHandler,
    {
        self.listen_with(topic, handler, ListenOptions::default())
    }

    /// `listen` with per-call options
    ///
    /// Credentials in `options` replace the pre-auth token exchange for
    /// every later connect attempt.
    pub fn listen_with<H>(&self, topic: &str, handler: H, options: ListenOptions) -> bool
    where
        H: TopicHandler,
    {
        if let Some(credentials) = options.credentials {
            debug!("Switching to static credentials for {}", credentials.username);
            *self.inner.auth.write() = Arc::new(StaticCredentials::new(credentials));
        }

        let handler: Arc<dyn TopicHandler> = Arc::new(handler);
        self.inner
            .with_machine(|machine| machine.listen(topic, handler))
    }

    /// The host regained connectivity
    ///
    /// Resets the error count, cancels a pending retry and reconnects if
    /// any topic is registered.
    pub fn network_online(&self) {
        self.inner
            .with_machine(|machine| ((), machine.network_online()));
    }

    /// The host lost connectivity
    ///
    /// Closes the channel without a close frame. Nothing reconnects until
    /// `network_online`.
    pub fn network_offline(&self) {
        self.inner
            .with_machine(|machine| ((), machine.network_offline()));
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.machine.lock().state()
    }

    /// Consecutive failures since the last successful handshake
    pub fn error_count(&self) -> u32 {
        self.inner.machine.lock().error_count()
    }

    /// Availability as of the last connect attempt
    pub fn is_available(&self) -> bool {
        self.inner.machine.lock().is_available()
    }

    pub fn is_online(&self) -> bool {
        self.inner.machine.lock().is_online()
    }

    /// Registered topics in first-registration order
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.inner.registry.topics()
    }

    /// Shutdown the client
    ///
    /// Closes the channel, cancels the retry timer and waits for the
    /// dispatch thread to drain. Later `listen` calls only register.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down push client");

        self.inner
            .with_machine(|machine| ((), machine.shutdown()));
        self.inner.cancel_retry();

        // Readers hold their own sender clones and drop them once their
        // channel is closed
        self.inner.dispatch_tx.lock().take();

        let thread = self.inner.dispatch_thread.lock().take();
        if let Some(thread) = thread {
            debug!("Waiting for dispatch thread to drain");
            let joined = tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| PushError::Handler(format!("dispatch join failed: {}", e)))?;
            if joined.is_err() {
                return Err(PushError::Handler("dispatch thread panicked".to_string()));
            }
        }

        info!("Push client shut down");
        Ok(())
    }
}

impl ClientInner {
    /// Run a transition and carry out its actions under the machine lock
    ///
    /// Actions only spawn or abort tasks, so holding the lock keeps them
    /// ordered with the transition that produced them.
    fn with_machine<T>(
        self: &Arc<Self>,
        transition: impl FnOnce(&mut ConnectionManager<SocketChannel>) -> (T, Vec<Action>),
    ) -> T {
        let mut machine = self.machine.lock();
        let (value, actions) = transition(&mut machine);
        for action in actions {
            self.execute(action);
        }
        value
    }

    fn execute(self: &Arc<Self>, action: Action) {
        match action {
            Action::Connect {
                generation,
                capabilities,
            } => {
                let inner = Arc::clone(self);
                self.runtime
                    .spawn(connect_attempt(inner, generation, capabilities));
            }
            Action::ScheduleRetry { delay } => self.schedule_retry(delay),
            Action::CancelRetry => self.cancel_retry(),
        }
    }

    fn schedule_retry(self: &Arc<Self>, delay: Duration) {
        let inner = Arc::clone(self);
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Retry timer fired");
            inner.with_machine(|machine| ((), machine.retry_fired()));
        });

        if let Some(previous) = self.retry.lock().replace(timer) {
            previous.abort();
        }
    }

    fn cancel_retry(&self) {
        if let Some(timer) = self.retry.lock().take() {
            timer.abort();
        }
    }

    fn report_failure(self: &Arc<Self>, generation: u64) {
        self.with_machine(|machine| ((), machine.connection_failed(generation)));
    }

    fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        self.auth.read().clone()
    }
}

/// One connect attempt, from pre-auth to the end of the channel
async fn connect_attempt(inner: Arc<ClientInner>, generation: u64, capabilities: PushCapabilities) {
    debug!(
        "Connect attempt {} to {}",
        generation, capabilities.endpoints.websocket
    );

    match run_channel(&inner, generation, &capabilities).await {
        Ok(ReadOutcome::Closed) => debug!("Channel {} closed", generation),
        Ok(ReadOutcome::DispatchClosed) => {
            if inner.machine.lock().is_shut_down() {
                debug!("Channel {} ended with the dispatch queue", generation);
            } else {
                // The reader is gone; free the slot so a new channel can take over
                error!("Dispatch queue closed under channel {}", generation);
                inner.report_failure(generation);
            }
        }
        Err(e) => {
            warn!("Channel {} failed: {}", generation, e);
            inner.report_failure(generation);
        }
    }
}

async fn run_channel(
    inner: &Arc<ClientInner>,
    generation: u64,
    capabilities: &PushCapabilities,
) -> Result<ReadOutcome> {
    let auth = inner
        .auth_provider()
        .pending_auth(&capabilities.endpoints.pre_auth)
        .await?;

    let request = build_request(&capabilities.endpoints.websocket, inner.headers.as_ref()).await?;
    let (channel, read, closed) = open_socket(request).await?;

    let opened = inner.with_machine(|machine| {
        (machine.socket_opened(generation, channel, auth), Vec::new())
    });
    if opened.is_err() {
        // Stale attempt; dropping the channel ends its writer
        return Ok(ReadOutcome::Closed);
    }

    let dispatch_tx = match inner.dispatch_tx.lock().clone() {
        Some(tx) => tx,
        None => return Ok(ReadOutcome::DispatchClosed),
    };

    let machine_inner = Arc::clone(inner);
    read_loop(read, closed, dispatch_tx, move || {
        machine_inner.machine.lock().authenticated(generation);
    })
    .await
}
