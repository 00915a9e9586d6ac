//! Command error taxonomy
//!
//! Every variant is surfaced only to the originating caller as an `error`
//! event; none of them is fatal to the connection or the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Room {code} not found.")]
    RoomNotFound { code: String },

    #[error("Room {code} is full (max {max} players).")]
    RoomFull { code: String, max: usize },

    #[error("Malformed command: {0}")]
    MalformedCommand(String),
}

impl GameError {
    /// Stable wire code for the `error` event payload
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound { .. } => "roomNotFound",
            GameError::RoomFull { .. } => "roomFull",
            GameError::MalformedCommand(_) => "malformedCommand",
        }
    }
}
