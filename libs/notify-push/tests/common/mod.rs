//! Common test utilities for notify-push integration tests
//!
//! Provides a mock push server that records every text frame per
//! connection and can push frames or drop connections on command.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use notify_push::{PushCapabilities, PushEndpoints, StaticCapabilities};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

#[derive(Debug, Clone)]
enum Command {
    Send(String),
    Drop,
}

#[derive(Default)]
struct ServerState {
    accepted: AtomicUsize,
    live: AtomicUsize,
    /// Text frames received, one list per accepted connection
    frames: Mutex<Vec<Vec<String>>>,
}

/// Mock push server
///
/// Answers `authenticated` once a connection has sent its two handshake
/// frames, unless built with `without_auth_ack`.
pub struct MockPushServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    state: Arc<ServerState>,
    commands: broadcast::Sender<Command>,
}

impl MockPushServer {
    /// Create and start a new mock push server
    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    pub async fn without_auth_ack() -> Self {
        Self::start_with(false).await
    }

    async fn start_with(ack_auth: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(ServerState::default());
        let (commands, _) = broadcast::channel(64);

        let shutdown_clone = shutdown.clone();
        let state_clone = state.clone();
        let commands_clone = commands.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                let state = state_clone.clone();
                                let commands = commands_clone.subscribe();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, state, commands, shutdown, ack_auth).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            state,
            commands,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        state: Arc<ServerState>,
        mut commands: broadcast::Receiver<Command>,
        shutdown: Arc<Notify>,
        ack_auth: bool,
    ) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let index = {
            let mut frames = state.frames.lock();
            frames.push(Vec::new());
            frames.len() - 1
        };
        state.accepted.fetch_add(1, Ordering::SeqCst);
        state.live.fetch_add(1, Ordering::SeqCst);

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let received = {
                                let mut frames = state.frames.lock();
                                frames[index].push(text);
                                frames[index].len()
                            };
                            if ack_auth && received == 2 {
                                if write.send(Message::Text("authenticated".into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(msg)) if msg.is_close() => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                command = commands.recv() => {
                    match command {
                        Ok(Command::Send(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Command::Drop) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }

        state.live.fetch_sub(1, Ordering::SeqCst);
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/push/ws", self.addr)
    }

    /// Capabilities pointing at this server
    ///
    /// Nothing serves the pre-auth endpoint; use `capabilities_with_pre_auth`
    /// for clients that rely on the token exchange.
    pub fn capabilities(&self) -> StaticCapabilities {
        StaticCapabilities::new(Some(PushCapabilities {
            types: vec!["files".to_string(), "notifications".to_string()],
            endpoints: PushEndpoints {
                websocket: self.ws_url(),
                pre_auth: format!("http://{}/apps/notify_push/pre_auth", self.addr),
            },
        }))
    }

    /// Capabilities pointing at this server, with pre-auth served by `pre_auth`
    pub fn capabilities_with_pre_auth(&self, pre_auth: &PreAuthServer) -> StaticCapabilities {
        StaticCapabilities::new(Some(PushCapabilities {
            types: vec!["files".to_string(), "notifications".to_string()],
            endpoints: PushEndpoints {
                websocket: self.ws_url(),
                pre_auth: pre_auth.url(),
            },
        }))
    }

    /// Push a text frame to every live connection
    pub fn send_frame(&self, text: &str) {
        let _ = self.commands.send(Command::Send(text.to_string()));
    }

    /// Drop every live connection without a close frame
    pub fn drop_connections(&self) {
        let _ = self.commands.send(Command::Drop);
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Frames received on connection `index`
    pub fn frames(&self, index: usize) -> Vec<String> {
        self.state
            .frames
            .lock()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockPushServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Mock pre-auth endpoint
///
/// Answers every HTTP request with `200 OK` and the configured token, and
/// records the raw request head.
pub struct PreAuthServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl PreAuthServer {
    pub async fn start(token: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = match stream.read(&mut buf).await {
                    Ok(n) => n,
                    Err(_) => continue,
                };
                recorded
                    .lock()
                    .push(String::from_utf8_lossy(&buf[..n]).to_string());

                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    token.len(),
                    token
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/apps/notify_push/pre_auth", self.addr)
    }

    /// Raw request heads received so far, lowercased
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.to_lowercase())
            .collect()
    }
}

impl Drop for PreAuthServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Capabilities whose websocket endpoint refuses connections
pub async fn unreachable_capabilities() -> StaticCapabilities {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    StaticCapabilities::new(Some(PushCapabilities {
        types: vec!["files".to_string()],
        endpoints: PushEndpoints {
            websocket: format!("ws://{}/push/ws", addr),
            pre_auth: format!("http://{}/apps/notify_push/pre_auth", addr),
        },
    }))
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
