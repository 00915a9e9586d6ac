//! Client-server message protocol definition

use serde::{Deserialize, Serialize};

/// Client → server messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    // Connection
    Heartbeat,

    // Room Management
    CreateRoom {
        username: Option<String>,
    },
    JoinRoom {
        code: String,
        username: Option<String>,
    },
    LeaveRoom,

    // Round Play
    SubmitAnswer {
        term: String,
    },
}

/// Server → client messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // Connection
    Connected {
        socket_id: String,
    },
    HeartbeatAck,
    Error {
        code: String,
        message: String,
    },

    // Room Events
    RoomCreated {
        code: String,
    },
    RoomJoined {
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
    },
    PlayerLeft {
        username: String,
        players: Vec<String>,
    },
    GameStart,
    GameStop {
        message: String,
    },

    // Round Events
    NewRound {
        topic: String,
    },
    WaitingForOpponent {
        count: usize,
    },
    RoundReveal {
        topic: String,
        answers: Vec<RevealedAnswer>,
    },
}

/// One entry of a reveal broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealedAnswer {
    pub username: String,
    pub term: String,
}
