// Tic-tac-toe channel messages.
//
// Commands flow sender -> receiver and are tagged by `command`; events flow
// receiver -> sender and are tagged by `event`.

use serde::{Deserialize, Serialize};

use crate::board::Mark;
use crate::error::{TttError, TttResult};

/// Namespace the game messages travel on.
pub const TTT_NAMESPACE: &str = "urn:x-cast:com.google.cast.demo.tictactoe";

/// Event tag strings, as sent by the receiver.
pub mod tags {
    pub const BOARD_LAYOUT_RESPONSE: &str = "board_layout_response";
    pub const ERROR: &str = "error";
    pub const MOVED: &str = "moved";
    pub const JOINED: &str = "joined";
    pub const ENDGAME: &str = "endgame";
}

/// Outbound command object: `{command, row?, column?, name?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Join { name: String },
    Leave,
    Move { row: usize, column: usize },
    BoardLayoutRequest,
    Endgame,
}

/// Inbound event, decoded from the untyped wire object by its `event` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BoardLayoutResponse { board: Vec<u8> },
    Error { message: String },
    Moved { player: Mark, row: usize, column: usize },
    Joined { player: Mark },
    Endgame { end_state: Option<String> },
    /// Any tag this sender does not understand.
    Unknown { event: String },
}

impl Event {
    /// The wire tag of this event.
    pub fn tag(&self) -> &str {
        match self {
            Event::BoardLayoutResponse { .. } => tags::BOARD_LAYOUT_RESPONSE,
            Event::Error { .. } => tags::ERROR,
            Event::Moved { .. } => tags::MOVED,
            Event::Joined { .. } => tags::JOINED,
            Event::Endgame { .. } => tags::ENDGAME,
            Event::Unknown { event } => event,
        }
    }
}

/// Inbound event object exactly as it appears on the wire.
///
/// Every field except the tag is optional; which ones must be present
/// depends on the tag and is checked when converting into [`Event`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_state: Option<String>,
}

fn required<T>(value: Option<T>, tag: &str, field: &str) -> TttResult<T> {
    value.ok_or_else(|| TttError::Codec(format!("'{tag}' event missing field '{field}'")))
}

impl TryFrom<WireEvent> for Event {
    type Error = TttError;

    fn try_from(wire: WireEvent) -> TttResult<Self> {
        let tag = wire.event.as_str();
        let event = match tag {
            tags::BOARD_LAYOUT_RESPONSE => Event::BoardLayoutResponse {
                board: required(wire.board, tag, "board")?,
            },
            tags::ERROR => Event::Error {
                message: wire.message.unwrap_or_default(),
            },
            tags::MOVED => Event::Moved {
                player: required(wire.player, tag, "player")?,
                row: required(wire.row, tag, "row")?,
                column: required(wire.column, tag, "column")?,
            },
            tags::JOINED => Event::Joined {
                player: required(wire.player, tag, "player")?,
            },
            tags::ENDGAME => Event::Endgame {
                end_state: wire.end_state,
            },
            _ => Event::Unknown { event: wire.event },
        };
        Ok(event)
    }
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        let mut wire = WireEvent {
            event: event.tag().to_string(),
            ..Default::default()
        };
        match event {
            Event::BoardLayoutResponse { board } => wire.board = Some(board),
            Event::Error { message } => wire.message = Some(message),
            Event::Moved { player, row, column } => {
                wire.player = Some(player);
                wire.row = Some(row);
                wire.column = Some(column);
            }
            Event::Joined { player } => wire.player = Some(player),
            Event::Endgame { end_state } => wire.end_state = end_state,
            Event::Unknown { .. } => {}
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_shapes() {
        let join = serde_json::to_value(Command::Join { name: "web player".into() }).unwrap();
        assert_eq!(join, serde_json::json!({"command": "join", "name": "web player"}));

        let mv = serde_json::to_value(Command::Move { row: 1, column: 2 }).unwrap();
        assert_eq!(mv, serde_json::json!({"command": "move", "row": 1, "column": 2}));

        let req = serde_json::to_value(Command::BoardLayoutRequest).unwrap();
        assert_eq!(req, serde_json::json!({"command": "board_layout_request"}));

        let leave = serde_json::to_value(Command::Leave).unwrap();
        assert_eq!(leave, serde_json::json!({"command": "leave"}));
    }

    #[test]
    fn moved_requires_coordinates() {
        let wire = WireEvent {
            event: "moved".into(),
            player: Some(Mark::X),
            row: Some(1),
            ..Default::default()
        };
        assert!(Event::try_from(wire).is_err());
    }

    #[test]
    fn unknown_tag_preserved() {
        let wire = WireEvent {
            event: "spectators".into(),
            ..Default::default()
        };
        let event = Event::try_from(wire).unwrap();
        assert_eq!(event, Event::Unknown { event: "spectators".into() });
        assert_eq!(event.tag(), "spectators");
    }

    #[test]
    fn endgame_without_state() {
        let wire = WireEvent {
            event: "endgame".into(),
            ..Default::default()
        };
        assert_eq!(
            Event::try_from(wire).unwrap(),
            Event::Endgame { end_state: None }
        );
    }
}
