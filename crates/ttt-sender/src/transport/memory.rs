//! In-process transport.
//!
//! Sessions live in shared memory. Whoever holds a [`MemorySessionHandle`]
//! plays the receiver: it sees every payload the sender queued and can push
//! events or remove the session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ttt_core::codec::{decode_command, encode_event};
use ttt_core::error::{TttError, TttResult};
use ttt_core::messages::{Command, Event};

use super::{
    AvailabilityListener, SessionSignal, SignalSink, Transport, TransportFuture, TransportSession,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct TransportState {
    next_id: u64,
    unavailable: Option<String>,
    fail_connects: Vec<String>,
    sessions: Vec<MemorySessionHandle>,
    availability_listeners: Vec<AvailabilityListener>,
}

impl fmt::Debug for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportState")
            .field("next_id", &self.next_id)
            .field("unavailable", &self.unavailable)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct SessionShared {
    sent: Vec<(String, String)>,
    stopped: bool,
    fail_sends: Option<String>,
    update_listeners: Vec<SignalSink>,
    message_listeners: HashMap<String, Vec<SignalSink>>,
}

/// In-memory [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ready()` fail with `reason`.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        lock(&self.state).unavailable = Some(reason.into());
    }

    /// Make the next `connect()` fail with `reason`.
    pub fn fail_next_connect(&self, reason: impl Into<String>) {
        lock(&self.state).fail_connects.push(reason.into());
    }

    /// Tell availability listeners whether a receiver can be reached.
    pub fn set_receiver_available(&self, available: bool) {
        let listeners = lock(&self.state).availability_listeners.clone();
        for listener in &listeners {
            listener(available);
        }
    }

    /// Number of sessions handed out so far.
    pub fn session_count(&self) -> usize {
        lock(&self.state).sessions.len()
    }

    /// The most recently created session.
    pub fn last_session(&self) -> Option<MemorySessionHandle> {
        lock(&self.state).sessions.last().cloned()
    }
}

impl Transport for MemoryTransport {
    fn add_availability_listener(&self, listener: AvailabilityListener) {
        lock(&self.state).availability_listeners.push(listener);
    }

    fn ready(&self) -> TransportFuture<()> {
        let unavailable = lock(&self.state).unavailable.clone();
        Box::pin(async move {
            match unavailable {
                Some(reason) => Err(TttError::Transport(reason)),
                None => Ok(()),
            }
        })
    }

    fn connect(&self) -> TransportFuture<Box<dyn TransportSession>> {
        let result = {
            let mut state = lock(&self.state);
            if state.fail_connects.is_empty() {
                state.next_id += 1;
                let handle = MemorySessionHandle {
                    id: format!("memory-{}", state.next_id),
                    shared: Arc::new(Mutex::new(SessionShared::default())),
                };
                state.sessions.push(handle.clone());
                Ok(handle)
            } else {
                Err(TttError::Transport(state.fail_connects.remove(0)))
            }
        };

        Box::pin(async move {
            let handle = result?;
            tracing::debug!("memory session {} connected", handle.id);
            Ok(Box::new(MemorySession { handle }) as Box<dyn TransportSession>)
        })
    }
}

/// The sender's end of an in-memory session.
#[derive(Debug)]
struct MemorySession {
    handle: MemorySessionHandle,
}

impl TransportSession for MemorySession {
    fn session_id(&self) -> &str {
        &self.handle.id
    }

    fn add_update_listener(&mut self, sink: SignalSink) {
        lock(&self.handle.shared).update_listeners.push(sink);
    }

    fn add_message_listener(&mut self, namespace: &str, sink: SignalSink) {
        lock(&self.handle.shared)
            .message_listeners
            .entry(namespace.to_string())
            .or_default()
            .push(sink);
    }

    fn send_message(&mut self, namespace: &str, payload: String) -> TttResult<()> {
        let (listeners, signal) = {
            let mut shared = lock(&self.handle.shared);
            if shared.stopped {
                return Err(TttError::Transport(format!(
                    "session {} is stopped",
                    self.handle.id
                )));
            }
            let signal = match &shared.fail_sends {
                Some(error) => SessionSignal::Failed {
                    error: error.clone(),
                },
                None => {
                    shared.sent.push((namespace.to_string(), payload.clone()));
                    SessionSignal::Sent { payload }
                }
            };
            (shared.update_listeners.clone(), signal)
        };

        for sink in &listeners {
            sink.emit(signal.clone());
        }
        Ok(())
    }

    fn stop(&mut self) -> TttResult<()> {
        let listeners = {
            let mut shared = lock(&self.handle.shared);
            shared.stopped = true;
            shared.update_listeners.clone()
        };
        for sink in &listeners {
            sink.emit(SessionSignal::Stopped);
        }
        Ok(())
    }
}

/// The receiver's view of an in-memory session.
#[derive(Debug, Clone)]
pub struct MemorySessionHandle {
    id: String,
    shared: Arc<Mutex<SessionShared>>,
}

impl MemorySessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Every `(namespace, payload)` the sender delivered, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        lock(&self.shared).sent.clone()
    }

    /// Delivered payloads decoded as game commands; undecodable ones are skipped.
    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent()
            .iter()
            .filter_map(|(_, payload)| decode_command(payload).ok())
            .collect()
    }

    /// Whether the sender asked to stop this session.
    pub fn is_stopped(&self) -> bool {
        lock(&self.shared).stopped
    }

    /// Make every later send report `Failed` with `error`.
    pub fn fail_sends(&self, error: impl Into<String>) {
        lock(&self.shared).fail_sends = Some(error.into());
    }

    /// Deliver a raw payload to listeners on `namespace`.
    pub fn deliver(&self, namespace: &str, payload: &str) {
        let listeners = lock(&self.shared)
            .message_listeners
            .get(namespace)
            .cloned()
            .unwrap_or_default();
        for sink in &listeners {
            sink.emit(SessionSignal::Message {
                namespace: namespace.to_string(),
                payload: payload.to_string(),
            });
        }
    }

    /// Encode `event` and deliver it on `namespace`.
    pub fn deliver_event(&self, namespace: &str, event: &Event) -> TttResult<()> {
        let payload = encode_event(event)?;
        self.deliver(namespace, &payload);
        Ok(())
    }

    /// Report a liveness change to the sender.
    pub fn update(&self, alive: bool) {
        let listeners = lock(&self.shared).update_listeners.clone();
        for sink in &listeners {
            sink.emit(SessionSignal::Updated { alive });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttt_core::messages::TTT_NAMESPACE;

    fn collecting_sink(id: &str) -> (SignalSink, Arc<Mutex<Vec<SessionSignal>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            SignalSink::new(id, move |_, signal| seen.lock().unwrap().push(signal))
        };
        (sink, seen)
    }

    #[tokio::test]
    async fn records_sends_and_reports_delivery() {
        let transport = MemoryTransport::new();
        let mut session = transport.connect().await.unwrap();
        let handle = transport.last_session().unwrap();
        assert_eq!(session.session_id(), handle.id());

        let (sink, seen) = collecting_sink(handle.id());
        session.add_update_listener(sink);
        session
            .send_message(TTT_NAMESPACE, r#"{"command":"leave"}"#.into())
            .unwrap();

        assert_eq!(handle.sent_commands(), vec![Command::Leave]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![SessionSignal::Sent {
                payload: r#"{"command":"leave"}"#.into()
            }]
        );
    }

    #[tokio::test]
    async fn connect_failure_is_one_shot() {
        let transport = MemoryTransport::new();
        transport.fail_next_connect("no receiver");

        assert!(transport.connect().await.is_err());
        assert!(transport.connect().await.is_ok());
        assert_eq!(transport.session_count(), 1);
    }

    #[tokio::test]
    async fn deliver_routes_by_namespace() {
        let transport = MemoryTransport::new();
        let mut session = transport.connect().await.unwrap();
        let handle = transport.last_session().unwrap();

        let (sink, seen) = collecting_sink(handle.id());
        session.add_message_listener(TTT_NAMESPACE, sink);

        handle.deliver("urn:other", "{}");
        handle
            .deliver_event(TTT_NAMESPACE, &Event::Endgame { end_state: None })
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            &seen[0],
            SessionSignal::Message { namespace, .. } if namespace == TTT_NAMESPACE
        ));
    }

    #[tokio::test]
    async fn stopped_session_rejects_sends() {
        let transport = MemoryTransport::new();
        let mut session = transport.connect().await.unwrap();
        session.stop().unwrap();
        assert!(transport.last_session().unwrap().is_stopped());
        assert!(session.send_message(TTT_NAMESPACE, "{}".into()).is_err());
    }

    #[test]
    fn availability_reaches_every_listener() {
        let transport = MemoryTransport::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            transport.add_availability_listener(Arc::new(move |available| {
                seen.lock().unwrap().push(available)
            }));
        }

        transport.set_receiver_available(true);
        transport.set_receiver_available(false);

        assert_eq!(*seen.lock().unwrap(), vec![true, true, false, false]);
    }
}
