//! The session controller.
//!
//! `SessionController` owns the receiver session and the view model. Every
//! input (a user action, a connect result, a session signal, the layout
//! timer) goes through one queue and is handled to completion before the
//! next one, so the model is never observed half-updated.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use ttt_core::board::{Board, BOARD_SIZE};
use ttt_core::codec::{decode_event, encode_command};
use ttt_core::error::{TttError, TttResult};
use ttt_core::messages::{Command, Event, TTT_NAMESPACE};

use crate::model::{
    ModelObserver, ViewModel, STATUS_GAME_OVER, STATUS_IN_PROGRESS, STATUS_NOT_STARTED,
    STATUS_OBSERVING, STATUS_WAITING,
};
use crate::transport::{SessionSignal, SignalSink, Transport, TransportSession};

/// Controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace the game messages travel on.
    pub namespace: String,
    /// Name sent with `join`.
    pub player_name: String,
    /// Delay before the first layout request on a new session.
    pub layout_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: TTT_NAMESPACE.to_string(),
            player_name: "web player".to_string(),
            layout_delay: Duration::from_millis(250),
        }
    }
}

/// Where the controller stands, derived from the session and the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    ConnectedIdle,
    WaitingToStart,
    InProgress,
    Observing,
    GameOver,
}

/// Actions a view can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Connect,
    Play,
    Stop,
    Quit,
    Move { row: usize, column: usize },
}

/// One unit of work for the controller.
pub enum Input {
    Action(UserAction),
    Ready(TttResult<()>),
    Connected(TttResult<Box<dyn TransportSession>>),
    Availability(bool),
    Signal { session_id: String, signal: SessionSignal },
    LayoutTimer,
    Shutdown,
}

/// Cloneable front-end for views running on other tasks.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    inbox: mpsc::UnboundedSender<Input>,
}

impl ControllerHandle {
    pub fn connect(&self) -> TttResult<()> {
        self.send(Input::Action(UserAction::Connect))
    }

    pub fn play(&self) -> TttResult<()> {
        self.send(Input::Action(UserAction::Play))
    }

    pub fn stop(&self) -> TttResult<()> {
        self.send(Input::Action(UserAction::Stop))
    }

    pub fn quit(&self) -> TttResult<()> {
        self.send(Input::Action(UserAction::Quit))
    }

    pub fn move_to(&self, row: usize, column: usize) -> TttResult<()> {
        self.send(Input::Action(UserAction::Move { row, column }))
    }

    /// Ask the run loop to exit after the inputs already queued.
    pub fn shutdown(&self) -> TttResult<()> {
        self.send(Input::Shutdown)
    }

    fn send(&self, input: Input) -> TttResult<()> {
        self.inbox.send(input).map_err(|_| TttError::ControllerClosed)
    }
}

/// Drives one sender: session lifecycle, commands out, events in.
pub struct SessionController {
    config: ControllerConfig,
    transport: Box<dyn Transport>,
    session: Option<Box<dyn TransportSession>>,
    model: ViewModel,
    connecting: bool,
    pending_join: bool,
    observers: Vec<Box<dyn ModelObserver>>,
    inbox_tx: mpsc::UnboundedSender<Input>,
    inbox_rx: mpsc::UnboundedReceiver<Input>,
}

impl SessionController {
    pub fn new(transport: impl Transport + 'static, config: ControllerConfig) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport: Box::new(transport),
            session: None,
            model: ViewModel::default(),
            connecting: false,
            pending_join: false,
            observers: Vec::new(),
            inbox_tx,
            inbox_rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            inbox: self.inbox_tx.clone(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ModelObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id())
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// A `join` is waiting for a session to exist.
    pub fn join_pending(&self) -> bool {
        self.pending_join
    }

    pub fn phase(&self) -> Phase {
        if self.session.is_none() {
            return if self.connecting {
                Phase::Connecting
            } else {
                Phase::Disconnected
            };
        }

        let m = &self.model;
        if m.game_in_progress {
            Phase::InProgress
        } else if m.observing {
            Phase::Observing
        } else if m.started {
            Phase::WaitingToStart
        } else if m.game_over {
            Phase::GameOver
        } else {
            Phase::ConnectedIdle
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Wait for the transport to become usable, then launch a session.
    ///
    /// Receiver availability changes reported from then on are logged.
    pub fn initialize(&mut self) {
        let listener_inbox = self.inbox_tx.clone();
        self.transport
            .add_availability_listener(Arc::new(move |available| {
                let _ = listener_inbox.send(Input::Availability(available));
            }));

        let ready = self.transport.ready();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = inbox.send(Input::Ready(ready.await));
        });
    }

    /// Request a session from the transport.
    pub fn connect(&mut self) {
        self.launch();
        self.notify();
    }

    /// End the game and the session.
    pub fn stop(&mut self) {
        self.stop_session();
        self.notify();
    }

    /// Join a game, launching a session first if there is none.
    pub fn play(&mut self) {
        self.join_game();
        self.notify();
    }

    /// Leave the game but keep the session.
    pub fn quit(&mut self) {
        self.leave_game();
        self.notify();
    }

    /// Place this client's mark at `(row, column)`.
    ///
    /// The board must be known, the cell on the board, and a mark assigned;
    /// otherwise nothing is sent. Turn order and occupancy are left to the
    /// receiver.
    pub fn move_to(&mut self, row: usize, column: usize) -> TttResult<()> {
        self.place_mark(row, column)?;
        self.notify();
        Ok(())
    }

    // ── Run loop ─────────────────────────────────────────────────────

    /// Handle one input and notify observers. Returns `false` on shutdown.
    pub fn dispatch(&mut self, input: Input) -> bool {
        let keep_running = self.handle_input(input);
        self.notify();
        keep_running
    }

    /// Wait for the next input and handle it.
    pub async fn step(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(input) => self.dispatch(input),
            None => false,
        }
    }

    /// Handle everything already queued, returning how many inputs ran.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(input) = self.inbox_rx.try_recv() {
            handled += 1;
            if !self.dispatch(input) {
                break;
            }
        }
        handled
    }

    /// Process inputs until a shutdown request.
    pub async fn run(mut self) {
        while self.step().await {}
        tracing::debug!("controller loop ended");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn handle_input(&mut self, input: Input) -> bool {
        match input {
            Input::Action(action) => self.on_action(action),
            Input::Ready(result) => self.on_ready(result),
            Input::Connected(result) => self.on_connected(result),
            Input::Availability(available) => {
                let availability = if available { "available" } else { "unavailable" };
                self.append_message(&format!("receiver listener: {availability}"));
            }
            Input::Signal { session_id, signal } => self.on_signal(&session_id, signal),
            Input::LayoutTimer => {
                if self.session.is_some() {
                    self.request_layout();
                }
            }
            Input::Shutdown => return false,
        }
        true
    }

    fn on_action(&mut self, action: UserAction) {
        match action {
            UserAction::Connect => self.launch(),
            UserAction::Play => self.join_game(),
            UserAction::Stop => self.stop_session(),
            UserAction::Quit => self.leave_game(),
            UserAction::Move { row, column } => {
                if let Err(e) = self.place_mark(row, column) {
                    tracing::warn!("move ({}, {}) rejected: {}", row, column, e);
                    let message = format!("Cannot move: {e}");
                    self.append_message(&message);
                    self.alert(&message);
                }
            }
        }
    }

    fn on_ready(&mut self, result: TttResult<()>) {
        match result {
            Ok(()) => {
                self.append_message("init success");
                self.model.api_initialized = true;
                self.launch();
            }
            Err(e) => {
                tracing::warn!("transport unavailable: {}", e);
                self.append_message(&e.to_string());
            }
        }
    }

    fn launch(&mut self) {
        if self.connecting {
            self.append_message("launch already in progress");
            return;
        }
        self.append_message("launching...");
        self.connecting = true;

        let connect = self.transport.connect();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = inbox.send(Input::Connected(connect.await));
        });
    }

    fn on_connected(&mut self, result: TttResult<Box<dyn TransportSession>>) {
        self.connecting = false;

        let mut session = match result {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("failed to launch session: {}", e);
                self.append_message(&e.to_string());
                self.pending_join = false;
                return;
            }
        };

        let session_id = session.session_id().to_string();
        tracing::info!("session {} established", session_id);
        self.append_message(&format!("New session ID: {session_id}"));

        let sink = self.signal_sink(&session_id);
        session.add_update_listener(sink.clone());
        session.add_message_listener(&self.config.namespace, sink);

        if let Some(mut previous) = self.session.replace(session) {
            tracing::info!("replacing session {}", previous.session_id());
            if let Err(e) = previous.stop() {
                self.append_message(&e.to_string());
            }
        }

        self.schedule_layout_request();

        if self.pending_join {
            self.pending_join = false;
            self.join_game();
        }
    }

    fn signal_sink(&self, session_id: &str) -> SignalSink {
        let inbox = self.inbox_tx.clone();
        SignalSink::new(session_id, move |id, signal| {
            let _ = inbox.send(Input::Signal {
                session_id: id.to_string(),
                signal,
            });
        })
    }

    fn schedule_layout_request(&self) {
        let delay = self.config.layout_delay;
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = inbox.send(Input::LayoutTimer);
        });
    }

    fn on_signal(&mut self, session_id: &str, signal: SessionSignal) {
        let current = self.session_id() == Some(session_id);

        match signal {
            SessionSignal::Message { namespace, payload } if current => {
                self.on_message(&namespace, &payload);
            }
            SessionSignal::Updated { alive } if current => self.on_session_update(alive),
            SessionSignal::Message { .. } | SessionSignal::Updated { .. } => {
                tracing::debug!("ignoring signal from stale session {}", session_id);
            }
            SessionSignal::Sent { payload } => {
                self.append_message(&format!("Message sent: {payload}"));
            }
            SessionSignal::Failed { error } => {
                tracing::warn!("session {}: {}", session_id, error);
                self.append_message(&error);
            }
            SessionSignal::Stopped => self.append_message("Session stopped"),
        }
    }

    fn on_session_update(&mut self, alive: bool) {
        let session_id = self.session_id().unwrap_or_default().to_string();
        if alive {
            self.append_message(&format!("Session Updated: {session_id}"));
            return;
        }

        tracing::info!("session {} removed", session_id);
        self.append_message(&format!("Session Removed: {session_id}"));
        self.session = None;
        self.model.reset();
        self.model.status = STATUS_NOT_STARTED.to_string();
        self.model.started = false;
    }

    fn on_message(&mut self, namespace: &str, payload: &str) {
        self.append_message(&format!("Got message: {namespace} {payload}"));
        if namespace != self.config.namespace {
            return;
        }

        match decode_event(payload) {
            Ok(event) => self.on_event(event),
            Err(e) => {
                tracing::warn!("undecodable event: {}", e);
                self.append_message(&e.to_string());
            }
        }
    }

    fn on_event(&mut self, event: Event) {
        tracing::debug!("event: {}", event.tag());

        match event {
            Event::BoardLayoutResponse { board } => match Board::from_layout(&board) {
                Ok(board) => self.model.board = Some(board),
                Err(e) => {
                    tracing::warn!("ignoring layout: {}", e);
                    self.append_message(&e.to_string());
                }
            },

            Event::Error { message } => {
                tracing::warn!("receiver error: {}", message);
                self.alert(&message);
            }

            Event::Moved {
                player,
                row,
                column,
            } => {
                if self.model.started {
                    self.model.my_turn = self.model.symbol != Some(player);
                    let placed = self
                        .model
                        .board
                        .as_mut()
                        .map(|board| board.set(row, column, player.cell()));
                    match placed {
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            tracing::warn!("ignoring move: {}", e);
                            self.append_message(&e.to_string());
                        }
                        None => self.request_layout(),
                    }
                } else {
                    self.model.status = STATUS_OBSERVING.to_string();
                    self.model.observing = true;
                    self.request_layout();
                }
            }

            Event::Joined { player } => {
                self.request_layout();
                self.model.symbol = Some(player);
                self.model.status = STATUS_IN_PROGRESS.to_string();
                self.model.game_in_progress = true;
                self.model.my_turn = player.is_first();
            }

            Event::Endgame { end_state } => {
                self.model.status = STATUS_GAME_OVER.to_string();
                self.model.game_over = true;
                self.model.outcome = end_state;
                self.model.game_in_progress = false;
                self.model.observing = false;
                self.model.started = false;
            }

            Event::Unknown { event } => {
                tracing::debug!("ignoring unknown event '{}'", event);
            }
        }
    }

    fn stop_session(&mut self) {
        let Some(session_id) = self.session_id().map(str::to_string) else {
            self.append_message("No session available");
            return;
        };

        self.append_message(&format!("Stopping {session_id}"));
        self.send_command(Command::Endgame);
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop() {
                tracing::warn!("failed to stop session {}: {}", session_id, e);
                self.append_message(&e.to_string());
            }
        }
        self.model.reset();
        self.model.status = STATUS_NOT_STARTED.to_string();
        self.model.started = false;
    }

    fn join_game(&mut self) {
        if self.session.is_none() {
            self.pending_join = true;
            self.launch();
            return;
        }

        self.send_command(Command::Join {
            name: self.config.player_name.clone(),
        });
        self.model.reset();
        self.model.status = STATUS_WAITING.to_string();
        self.model.started = true;
    }

    fn leave_game(&mut self) {
        self.send_command(Command::Leave);
        self.model.reset();
    }

    fn place_mark(&mut self, row: usize, column: usize) -> TttResult<()> {
        if self.model.board.is_none() {
            return Err(TttError::BoardUnknown);
        }
        if row >= BOARD_SIZE || column >= BOARD_SIZE {
            return Err(TttError::InvalidMove(format!(
                "cell ({row}, {column}) is off the board"
            )));
        }
        let mark = self.model.symbol.ok_or(TttError::NotJoined)?;

        self.send_command(Command::Move { row, column });
        self.model.my_turn = false;
        if let Some(board) = self.model.board.as_mut() {
            board.set(row, column, mark.cell())?;
        }
        Ok(())
    }

    fn request_layout(&mut self) {
        self.send_command(Command::BoardLayoutRequest);
    }

    fn send_command(&mut self, command: Command) {
        if self.session.is_none() {
            self.append_message("No session available");
            return;
        }

        let payload = match encode_command(&command) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("failed to encode {:?}: {}", command, e);
                self.append_message(&e.to_string());
                return;
            }
        };

        self.append_message(&format!("Sending {payload}"));
        tracing::debug!("sending {}", payload);

        let result = match self.session.as_mut() {
            Some(session) => session.send_message(&self.config.namespace, payload),
            None => Err(TttError::NoSession),
        };
        if let Err(e) = result {
            tracing::warn!("send failed: {}", e);
            self.append_message(&e.to_string());
        }
    }

    fn append_message(&mut self, line: &str) {
        tracing::debug!("{}", line);
        self.model.append_message(line);
    }

    fn alert(&mut self, message: &str) {
        for observer in &mut self.observers {
            observer.alert(message);
        }
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer.model_changed(&self.model);
        }
    }
}
