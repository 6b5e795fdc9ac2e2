//! WebSocket transport for the push channel
//!
//! One open channel is two tasks:
//!
//! ```text
//! ConnectionManager ──send_text──> Unbounded queue ──> Writer task ──> WebSocket
//! WebSocket ──> Reader loop ──parse──> Dispatch queue / ConnectionManager
//! ```
//!
//! `close()` wakes the reader and drops the outbound queue, which ends the
//! writer. Both halves of the socket are then dropped without a close frame.

use crate::core::dispatcher::{parse_frame, Frame};
use crate::core::state_machine::ChannelSink;
use crate::traits::{HeaderProvider, PushError, Result, TopicEvent};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{http, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsWrite = SplitSink<WsStream, Message>;
pub(crate) type WsRead = SplitStream<WsStream>;

/// Handle to an open socket, stored in the `Open` slot
pub struct SocketChannel {
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<Notify>,
}

impl ChannelSink for SocketChannel {
    fn send_text(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }

    fn close(&self) {
        // notify_one keeps a permit if the reader is not parked right now
        self.closed.notify_one();
    }
}

/// Build the upgrade request, applying provider headers
pub(crate) async fn build_request(
    url: &str,
    headers: Option<&Arc<dyn HeaderProvider>>,
) -> Result<Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| PushError::Configuration(format!("invalid websocket url '{}': {}", url, e)))?;

    if let Some(provider) = headers {
        for (key, value) in provider.get_headers().await {
            match (
                key.parse::<http::header::HeaderName>(),
                value.parse::<http::header::HeaderValue>(),
            ) {
                (Ok(name), Ok(value)) => {
                    request.headers_mut().insert(name, value);
                }
                _ => warn!("Skipping invalid header '{}'", key),
            }
        }
    }

    Ok(request)
}

/// Open the socket and start its writer task
///
/// Returns the channel handle, the read half and the close signal the
/// reader must watch.
pub(crate) async fn open_socket(request: Request) -> Result<(SocketChannel, WsRead, Arc<Notify>)> {
    let uri = request.uri().clone();
    let (ws_stream, _) = connect_async(request).await?;
    info!("Connected to {}", uri);

    let (write, read) = ws_stream.split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(Notify::new());

    tokio::spawn(write_loop(write, outbound_rx));

    let channel = SocketChannel {
        outbound,
        closed: Arc::clone(&closed),
    };
    Ok((channel, read, closed))
}

async fn write_loop(mut write: WsWrite, mut outbound_rx: mpsc::UnboundedReceiver<String>) {
    while let Some(frame) = outbound_rx.recv().await {
        if let Err(e) = write.send(Message::Text(frame)).await {
            warn!("Failed to send frame: {}", e);
            break;
        }
    }
    debug!("Writer task exiting");
}

/// How the read loop ended
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// The state machine tore the channel down
    Closed,
    /// The dispatch queue is gone (client shutting down)
    DispatchClosed,
}

/// Consume inbound frames until the socket fails or is closed
///
/// `on_authenticated` runs for every `authenticated` control frame.
/// Returns `Err` when the socket errored or the server ended the stream.
pub(crate) async fn read_loop<F>(
    mut read: WsRead,
    closed: Arc<Notify>,
    dispatch_tx: mpsc::Sender<TopicEvent>,
    on_authenticated: F,
) -> Result<ReadOutcome>
where
    F: Fn(),
{
    loop {
        tokio::select! {
            _ = closed.notified() => {
                debug!("Channel closed locally, reader exiting");
                return Ok(ReadOutcome::Closed);
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received frame: {}", text);
                        match parse_frame(&text) {
                            Ok(Frame::Authenticated) => on_authenticated(),
                            Ok(Frame::ServerError(message)) => {
                                warn!("Push server reported an error: {}", message);
                            }
                            Ok(Frame::Event(event)) => {
                                if dispatch_tx.send(event).await.is_err() {
                                    debug!("Dispatch queue closed, reader exiting");
                                    return Ok(ReadOutcome::DispatchClosed);
                                }
                            }
                            Err(e) => warn!("Dropping frame: {}", e),
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Server sent close frame: {:?}", frame);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        return Err(PushError::WebSocket(e.to_string()));
                    }
                    None => {
                        info!("WebSocket stream closed");
                        return Err(PushError::ConnectionClosed("stream ended".into()));
                    }
                }
            }
        }
    }
}
