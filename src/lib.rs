//! WordClash game server library
//!
//! Rooms of 2-8 players play rounds of word association: the server
//! broadcasts a topic, collects one term per player, and reveals all
//! answers at once before scheduling the next round.

pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod state;
