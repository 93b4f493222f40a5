//! ttt-sender: sender-side controller for a remote tic-tac-toe receiver.
//!
//! Connects to a receiver through a [`Transport`], relays game commands over
//! a namespaced channel, and keeps a [`ViewModel`] in sync with the events the
//! receiver sends back.
//!
//! # Quick Start
//!
//! ```no_run
//! use ttt_sender::{ControllerConfig, SessionController, WebSocketTransport};
//!
//! # async fn example() -> ttt_core::TttResult<()> {
//! let transport = WebSocketTransport::new("ws://receiver.local:8008/ttt")?;
//! let mut controller = SessionController::new(transport, ControllerConfig::default());
//! let handle = controller.handle();
//!
//! controller.play();
//! tokio::spawn(controller.run());
//!
//! handle.move_to(1, 1)?;
//! handle.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod model;
pub mod transport;

// Re-export primary public types.
pub use controller::{
    ControllerConfig, ControllerHandle, Input, Phase, SessionController, UserAction,
};
pub use model::{ModelObserver, ViewModel};
pub use transport::{
    AvailabilityListener, MemorySessionHandle, MemoryTransport, SessionSignal, SignalSink,
    Transport, TransportSession, WebSocketTransport,
};

// Re-export ttt-core error types for convenience.
pub use ttt_core::{TttError, TttResult};
