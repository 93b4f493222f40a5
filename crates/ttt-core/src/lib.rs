//! ttt-core: Shared protocol library for the tic-tac-toe sender.
//!
//! Provides the board and mark types, the command/event message sum types,
//! the JSON channel codec, and the common error type.

pub mod board;
pub mod codec;
pub mod error;
pub mod messages;

// Re-export commonly used items at crate root.
pub use board::{Board, Cell, Mark, BOARD_SIZE, CELL_COUNT};
pub use codec::{decode_command, decode_event, encode_command, encode_event, ChannelFrame};
pub use error::{TttError, TttResult};
pub use messages::{Command, Event, WireEvent, TTT_NAMESPACE};
