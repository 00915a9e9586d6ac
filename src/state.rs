//! Application state: room registry, player sessions, per-room game state

use crate::config::Config;
use crate::protocol::ServerMessage;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc::UnboundedSender, Mutex, RwLock};
use tokio::task::AbortHandle;

/// A room needs at least this many players to run rounds; dropping below
/// it through a removal destroys the room.
pub const MIN_PLAYERS: usize = 2;

/// Global application state
pub struct AppState {
    /// Live rooms (room code -> Room)
    pub rooms: DashMap<String, Room>,
    /// Player sessions (connection handle -> PlayerSession)
    pub players: DashMap<String, PlayerSession>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            rooms: DashMap::new(),
            players: DashMap::new(),
            config: Arc::new(config),
        }
    }
}

/// One game session, addressed by its short code
pub struct Room {
    #[allow(dead_code)]
    pub code: String,
    pub created_at: Instant,
    /// Membership, topic and answers live under one lock so every event
    /// observes them consistently.
    pub game: RwLock<GameState>,
    /// Scheduled reveal-to-next-round task; aborted when the room dies.
    pub next_round_timer: Mutex<Option<AbortHandle>>,
}

impl Room {
    pub fn new(code: String) -> Self {
        Self {
            code,
            created_at: Instant::now(),
            game: RwLock::new(GameState::default()),
            next_round_timer: Mutex::new(None),
        }
    }

    /// Room pre-seeded with its creator as the first player.
    pub fn with_player(code: String, player: PlayerRecord) -> Self {
        let game = GameState {
            players: vec![player],
            ..GameState::default()
        };
        Self {
            code,
            created_at: Instant::now(),
            game: RwLock::new(game),
            next_round_timer: Mutex::new(None),
        }
    }
}

/// Mutable round/membership state of a room
#[derive(Debug, Default)]
pub struct GameState {
    /// Join order; stable for display, irrelevant to game logic
    pub players: Vec<PlayerRecord>,
    /// Prompt of the running round, absent between games
    pub current_topic: Option<String>,
    /// Arrival-ordered answers for the running round, one per player
    pub round_answers: Vec<SubmittedAnswer>,
}

impl GameState {
    pub fn has_answered(&self, player_id: &str) -> bool {
        self.round_answers.iter().any(|a| a.player_id == player_id)
    }

    pub fn username_of(&self, player_id: &str) -> Option<String> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.username.clone())
    }

    /// Players still owing an answer this round
    pub fn remaining_count(&self) -> usize {
        self.players.len().saturating_sub(self.round_answers.len())
    }

    /// A round completes only while collecting and with players present,
    /// so an emptied room never trivially "completes" at 0 == 0.
    pub fn is_complete(&self) -> bool {
        self.current_topic.is_some()
            && !self.players.is_empty()
            && self.round_answers.len() >= self.players.len()
    }
}

/// One player inside a room
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    /// Owning connection handle
    pub id: String,
    pub username: String,
}

/// An answer recorded for the running round. The username is denormalized
/// at submission time so the answer survives the player leaving before
/// the reveal.
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub player_id: String,
    pub username: String,
    pub term: String,
}

/// Per-connection session info
pub struct PlayerSession {
    #[allow(dead_code)]
    pub id: String,
    /// Current room membership; the authoritative mapping, updated in the
    /// same handler as any room mutation.
    pub room_code: RwLock<Option<String>>,
    pub sender: UnboundedSender<ServerMessage>,
    #[allow(dead_code)]
    pub connected_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            username: name.to_string(),
        }
    }

    fn answer(id: &str, name: &str, term: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            player_id: id.to_string(),
            username: name.to_string(),
            term: term.to_string(),
        }
    }

    #[test]
    fn test_remaining_count_tracks_submissions() {
        let mut game = GameState::default();
        game.players.push(player("a", "Ann"));
        game.players.push(player("b", "Ben"));
        assert_eq!(game.remaining_count(), 2);

        game.round_answers.push(answer("a", "Ann", "Pizza"));
        assert_eq!(game.remaining_count(), 1);
        assert!(game.has_answered("a"));
        assert!(!game.has_answered("b"));
    }

    #[test]
    fn test_completion_requires_active_round() {
        let mut game = GameState::default();
        game.players.push(player("a", "Ann"));
        game.players.push(player("b", "Ben"));
        game.round_answers.push(answer("a", "Ann", "Pizza"));
        game.round_answers.push(answer("b", "Ben", "Pasta"));

        // all answers in, but no topic set
        assert!(!game.is_complete());

        game.current_topic = Some("Pizza topping".to_string());
        assert!(game.is_complete());
    }

    #[test]
    fn test_empty_room_never_completes() {
        let mut game = GameState::default();
        game.current_topic = Some("A color".to_string());
        assert!(!game.is_complete());
    }

    #[test]
    fn test_completion_survives_member_shrink() {
        let mut game = GameState::default();
        game.players.push(player("a", "Ann"));
        game.players.push(player("b", "Ben"));
        game.players.push(player("c", "Cy"));
        game.current_topic = Some("A pet".to_string());
        game.round_answers.push(answer("a", "Ann", "Cat"));
        game.round_answers.push(answer("b", "Ben", "Dog"));
        assert!(!game.is_complete());

        // the player still owing an answer leaves
        game.players.retain(|p| p.id != "c");
        assert!(game.is_complete());
    }

    #[test]
    fn test_username_lookup() {
        let mut game = GameState::default();
        game.players.push(player("a", "Ann"));
        assert_eq!(game.username_of("a").as_deref(), Some("Ann"));
        assert_eq!(game.username_of("zz"), None);
    }
}
