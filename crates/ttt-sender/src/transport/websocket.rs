//! WebSocket transport for the sender.
//!
//! One WebSocket connection is one session. Every text frame carries a JSON
//! [`ChannelFrame`] so several namespaces can share the socket:
//!
//! `{"namespace": "urn:x-cast:...", "data": "<payload>"}`
//!
//! A single I/O task owns the socket. The session handle talks to it through
//! an unbounded request queue, so `send_message` and `stop` never block.
//! Requests are handled in order, so listeners registered before a send are
//! in place before any reply to it can arrive.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ttt_core::codec::ChannelFrame;
use ttt_core::error::{TttError, TttResult};

use super::{SessionSignal, SignalSink, Transport, TransportFuture, TransportSession};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Requests from the session handle to its I/O task.
#[derive(Debug)]
enum Request {
    Send { namespace: String, payload: String },
    Stop,
    UpdateListener(SignalSink),
    MessageListener { namespace: String, sink: SignalSink },
}

/// Connects to a receiver over `ws://` or `wss://`.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> TttResult<Self> {
        let url = url.into();
        let lower = url.to_lowercase();
        if !(lower.starts_with("ws://") || lower.starts_with("wss://")) {
            return Err(TttError::Transport(format!(
                "unsupported URL scheme: {url} (expected ws:// or wss://)"
            )));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self) -> TransportFuture<Box<dyn TransportSession>> {
        let url = self.url.clone();
        Box::pin(async move {
            let session = WebSocketSession::connect(&url).await?;
            Ok(Box::new(session) as Box<dyn TransportSession>)
        })
    }
}

/// A session backed by one WebSocket connection.
#[derive(Debug)]
pub struct WebSocketSession {
    session_id: String,
    requests: mpsc::UnboundedSender<Request>,
}

impl WebSocketSession {
    /// Open the socket and start its I/O task.
    pub async fn connect(url: &str) -> TttResult<Self> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| TttError::Transport(format!("WebSocket connect error: {e}")))?;

        let session_id = hex::encode(rand::random::<[u8; 8]>());
        tracing::info!("WebSocket session {} connected to {}", session_id, url);

        let (requests, requests_rx) = mpsc::unbounded_channel();
        tokio::spawn(io_loop(socket, requests_rx, session_id.clone()));

        Ok(Self {
            session_id,
            requests,
        })
    }

    fn request(&self, request: Request) -> TttResult<()> {
        self.requests.send(request).map_err(|_| {
            TttError::Transport(format!("session {} is closed", self.session_id))
        })
    }
}

impl TransportSession for WebSocketSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn add_update_listener(&mut self, sink: SignalSink) {
        if self.request(Request::UpdateListener(sink)).is_err() {
            tracing::debug!("update listener added to closed session {}", self.session_id);
        }
    }

    fn add_message_listener(&mut self, namespace: &str, sink: SignalSink) {
        let request = Request::MessageListener {
            namespace: namespace.to_string(),
            sink,
        };
        if self.request(request).is_err() {
            tracing::debug!("message listener added to closed session {}", self.session_id);
        }
    }

    fn send_message(&mut self, namespace: &str, payload: String) -> TttResult<()> {
        self.request(Request::Send {
            namespace: namespace.to_string(),
            payload,
        })
    }

    fn stop(&mut self) -> TttResult<()> {
        self.request(Request::Stop)
    }
}

fn notify(listeners: &[SignalSink], signal: SessionSignal) {
    for sink in listeners {
        sink.emit(signal.clone());
    }
}

/// Owns the socket: writes queued requests, routes incoming frames.
///
/// After the peer hangs up the loop keeps serving requests so listeners that
/// register late still learn the session is gone. It ends on `Stop` or when
/// every session handle has been dropped.
async fn io_loop(
    mut socket: Socket,
    mut requests: mpsc::UnboundedReceiver<Request>,
    session_id: String,
) {
    let mut update_listeners: Vec<SignalSink> = Vec::new();
    let mut message_listeners: HashMap<String, Vec<SignalSink>> = HashMap::new();
    let mut closed = false;

    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Send { namespace, payload }) => {
                    let result = if closed {
                        Err(format!("session {session_id} is closed"))
                    } else {
                        match ChannelFrame::new(namespace, payload.clone()).encode() {
                            Ok(text) => socket
                                .send(Message::Text(text))
                                .await
                                .map_err(|e| format!("WS write error: {e}")),
                            Err(e) => Err(e.to_string()),
                        }
                    };
                    let signal = match result {
                        Ok(()) => SessionSignal::Sent { payload },
                        Err(error) => {
                            tracing::warn!("session {}: {}", session_id, error);
                            SessionSignal::Failed { error }
                        }
                    };
                    notify(&update_listeners, signal);
                }
                Some(Request::Stop) => {
                    let signal = if closed {
                        SessionSignal::Stopped
                    } else {
                        match socket.close(None).await {
                            Ok(()) => SessionSignal::Stopped,
                            Err(e) => SessionSignal::Failed {
                                error: format!("WS close error: {e}"),
                            },
                        }
                    };
                    notify(&update_listeners, signal);
                    break;
                }
                Some(Request::UpdateListener(sink)) => {
                    if closed {
                        sink.emit(SessionSignal::Updated { alive: false });
                    }
                    update_listeners.push(sink);
                }
                Some(Request::MessageListener { namespace, sink }) => {
                    message_listeners.entry(namespace).or_default().push(sink);
                }
                None => {
                    if !closed {
                        let _ = socket.close(None).await;
                    }
                    break;
                }
            },

            frame = socket.next(), if !closed => match frame {
                Some(Ok(Message::Text(text))) => match ChannelFrame::decode(&text) {
                    Ok(frame) => match message_listeners.get(&frame.namespace) {
                        Some(listeners) => notify(
                            listeners,
                            SessionSignal::Message {
                                namespace: frame.namespace.clone(),
                                payload: frame.data,
                            },
                        ),
                        None => tracing::debug!(
                            "session {}: no listener for namespace {}",
                            session_id,
                            frame.namespace
                        ),
                    },
                    Err(e) => tracing::warn!("session {}: bad frame: {}", session_id, e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("session {} closed by receiver", session_id);
                    closed = true;
                    notify(&update_listeners, SessionSignal::Updated { alive: false });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("session {} read error: {}", session_id, e);
                    closed = true;
                    notify(&update_listeners, SessionSignal::Updated { alive: false });
                }
            },
        }
    }

    tracing::debug!("session {} I/O loop ended", session_id);
}
