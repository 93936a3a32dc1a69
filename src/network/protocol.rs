// Data channel wire format
// Game frames are JSON objects tagged by "type"; the number demo sends bare decimal text

use serde::{Deserialize, Serialize};

use super::error::ConnectionError;
use crate::game::Board;

/// Frames exchanged by the tic-tac-toe demo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameMessage {
    /// Full board after the sender's move
    Move { board: Board },

    /// Start a new round
    Reset,
}

impl GameMessage {
    pub fn to_text(&self) -> Result<String, ConnectionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self, ConnectionError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn encode_number(value: i64) -> String {
    value.to_string()
}

pub fn decode_number(text: &str) -> Result<i64, ConnectionError> {
    text.trim()
        .parse()
        .map_err(|e| ConnectionError::Parse(format!("{:?} is not a number: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::board_from;

    #[test]
    fn test_move_frame_format() {
        let board = board_from(["X", "", "", "", "O", "", "", "", ""]);
        let text = GameMessage::Move { board }.to_text().unwrap();
        assert_eq!(
            text,
            r#"{"type":"move","board":["X","","","","O","","","",""]}"#
        );
    }

    #[test]
    fn test_reset_frame_format() {
        assert_eq!(GameMessage::Reset.to_text().unwrap(), r#"{"type":"reset"}"#);
    }

    #[test]
    fn test_decode_frames_from_peer() {
        let msg = GameMessage::from_text(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(msg, GameMessage::Reset);

        let msg =
            GameMessage::from_text(r#"{"type":"move","board":["","","","","","","","","X"]}"#)
                .unwrap();
        match msg {
            GameMessage::Move { board } => assert_eq!(board[8], crate::game::Cell::X),
            other => panic!("expected move, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frames_are_parse_errors() {
        for text in [
            r#"{"type":"chat","text":"hi"}"#,
            r#"{"type":"move","board":["X"]}"#,
            r#"{"type":"move","board":["Z","","","","","","","",""]}"#,
            "42",
        ] {
            assert!(
                matches!(GameMessage::from_text(text), Err(ConnectionError::Parse(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_number_wire_format() {
        assert_eq!(encode_number(-15), "-15");
        assert_eq!(decode_number("123").unwrap(), 123);
        assert!(matches!(decode_number("twelve"), Err(ConnectionError::Parse(_))));
    }
}
