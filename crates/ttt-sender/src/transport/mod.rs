//! Session transport abstraction for the sender.
//!
//! A [`Transport`] produces [`TransportSession`]s. Session callbacks (inbound
//! messages, liveness updates, delivery outcomes) are not closures on the
//! controller: they are [`SessionSignal`]s pushed through a [`SignalSink`],
//! which the controller turns into inputs on its own queue.
//!
//! - `ws://` or `wss://` → [`WebSocketTransport`]
//! - in-process → [`MemoryTransport`]

pub mod memory;
pub mod websocket;

pub use memory::{MemorySessionHandle, MemoryTransport};
pub use websocket::{WebSocketSession, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ttt_core::error::TttResult;

/// Boxed future returned by transport operations.
pub type TransportFuture<T> = Pin<Box<dyn Future<Output = TttResult<T>> + Send + 'static>>;

/// Something a session reports back asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// A payload arrived on a subscribed namespace.
    Message { namespace: String, payload: String },
    /// The session is still alive, or has been removed by the far end.
    Updated { alive: bool },
    /// A payload passed to `send_message` was delivered.
    Sent { payload: String },
    /// A send or stop request failed.
    Failed { error: String },
    /// A `stop` request completed.
    Stopped,
}

/// Destination for signals from one session.
///
/// Every signal is tagged with the id of the session it came from, so the
/// receiver can tell a live session from a stale one.
#[derive(Clone)]
pub struct SignalSink {
    session_id: String,
    deliver: Arc<dyn Fn(&str, SessionSignal) + Send + Sync>,
}

impl SignalSink {
    pub fn new(
        session_id: impl Into<String>,
        deliver: impl Fn(&str, SessionSignal) + Send + Sync + 'static,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            deliver: Arc::new(deliver),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn emit(&self, signal: SessionSignal) {
        (self.deliver)(&self.session_id, signal);
    }
}

impl fmt::Debug for SignalSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSink")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// Called with `true` when a receiver becomes reachable, `false` when none is.
pub type AvailabilityListener = Arc<dyn Fn(bool) + Send + Sync>;

/// A live connection to a receiver.
///
/// All methods return immediately. Outcomes of `send_message` and `stop`
/// arrive later on the update listeners as `Sent`, `Failed` or `Stopped`.
pub trait TransportSession: Send {
    fn session_id(&self) -> &str;

    /// Register for `Updated` signals and delivery outcomes.
    fn add_update_listener(&mut self, sink: SignalSink);

    /// Register for `Message` signals on `namespace`.
    fn add_message_listener(&mut self, namespace: &str, sink: SignalSink);

    /// Queue `payload` for delivery on `namespace`.
    fn send_message(&mut self, namespace: &str, payload: String) -> TttResult<()>;

    /// Ask the far end to terminate the session.
    fn stop(&mut self) -> TttResult<()>;
}

/// Factory for receiver sessions.
pub trait Transport: Send + Sync {
    /// Resolves once the transport can be used.
    fn ready(&self) -> TransportFuture<()> {
        Box::pin(async { Ok(()) })
    }

    /// Register for receiver availability changes. Transports that cannot
    /// discover receivers never report any.
    fn add_availability_listener(&self, _listener: AvailabilityListener) {}

    /// Establish a new session with the receiver.
    fn connect(&self) -> TransportFuture<Box<dyn TransportSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn sink_tags_signals_with_session_id() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            SignalSink::new("abc", move |id, signal| {
                seen.lock().unwrap().push((id.to_string(), signal));
            })
        };

        sink.emit(SessionSignal::Stopped);
        sink.clone().emit(SessionSignal::Updated { alive: false });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("abc".to_string(), SessionSignal::Stopped),
                ("abc".to_string(), SessionSignal::Updated { alive: false }),
            ]
        );
    }
}
