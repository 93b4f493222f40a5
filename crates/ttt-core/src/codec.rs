//! JSON encoding for the game channel.
//!
//! Game messages are JSON objects carried as strings. On a shared socket each
//! one is wrapped in a [`ChannelFrame`] naming its namespace:
//!
//! `{"namespace": "urn:x-cast:...", "data": "{\"command\":\"leave\"}"}`

use serde::{Deserialize, Serialize};

use crate::error::TttResult;
use crate::messages::{Command, Event, WireEvent};

/// Encode an outbound command into its JSON payload.
pub fn encode_command(command: &Command) -> TttResult<String> {
    Ok(serde_json::to_string(command)?)
}

/// Decode a command payload (receiver side).
pub fn decode_command(payload: &str) -> TttResult<Command> {
    Ok(serde_json::from_str(payload)?)
}

/// Decode an inbound event payload.
///
/// Unrecognised tags yield [`Event::Unknown`]; malformed JSON or a known tag
/// with missing fields is an error.
pub fn decode_event(payload: &str) -> TttResult<Event> {
    let wire: WireEvent = serde_json::from_str(payload)?;
    Event::try_from(wire)
}

/// Encode an event payload (receiver side).
pub fn encode_event(event: &Event) -> TttResult<String> {
    Ok(serde_json::to_string(&WireEvent::from(event.clone()))?)
}

/// One namespaced message on a multiplexed connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFrame {
    pub namespace: String,
    pub data: String,
}

impl ChannelFrame {
    pub fn new(namespace: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            data: data.into(),
        }
    }

    pub fn encode(&self) -> TttResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> TttResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Mark;
    use crate::error::TttError;

    #[test]
    fn decode_layout_response() {
        let event =
            decode_event(r#"{"event":"board_layout_response","board":[0,1,2,0,0,0,0,0,0]}"#)
                .unwrap();
        assert_eq!(
            event,
            Event::BoardLayoutResponse {
                board: vec![0, 1, 2, 0, 0, 0, 0, 0, 0]
            }
        );
    }

    #[test]
    fn decode_moved() {
        let event = decode_event(r#"{"event":"moved","player":"O","row":2,"column":0}"#).unwrap();
        assert_eq!(
            event,
            Event::Moved {
                player: Mark::O,
                row: 2,
                column: 0
            }
        );
    }

    #[test]
    fn decode_unknown_tag() {
        let event = decode_event(r#"{"event":"rematch","player":"X"}"#).unwrap();
        assert!(matches!(event, Event::Unknown { ref event } if event == "rematch"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_event("not json"), Err(TttError::Codec(_))));
        assert!(decode_event(r#"{"board":[]}"#).is_err());
        assert!(decode_event(r#"{"event":"joined","player":"Z"}"#).is_err());
    }

    #[test]
    fn encode_event_skips_absent_fields() {
        let text = encode_event(&Event::Joined { player: Mark::X }).unwrap();
        assert_eq!(text, r#"{"event":"joined","player":"X"}"#);
    }

    #[test]
    fn command_payload_reads_back() {
        let text = encode_command(&Command::Move { row: 0, column: 2 }).unwrap();
        assert_eq!(decode_command(&text).unwrap(), Command::Move { row: 0, column: 2 });
    }

    #[test]
    fn channel_frame_wraps_payload() {
        let frame = ChannelFrame::new("urn:test", r#"{"command":"leave"}"#);
        let text = frame.encode().unwrap();
        let back = ChannelFrame::decode(&text).unwrap();
        assert_eq!(back.namespace, "urn:test");
        assert_eq!(decode_command(&back.data).unwrap(), Command::Leave);
    }
}
