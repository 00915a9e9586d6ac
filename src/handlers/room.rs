//! Room lifecycle handlers: create, join, leave, destroy

use crate::error::GameError;
use crate::handlers::round;
use crate::protocol::ServerMessage;
use crate::state::{AppState, PlayerRecord, Room, MIN_PLAYERS};
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 4;

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Create a room with the caller as its first player. Always succeeds;
/// the code is regenerated until it misses every live room.
pub async fn handle_create_room(state: Arc<AppState>, player_id: &str, username: Option<String>) {
    let username = username.unwrap_or_else(|| "Host".to_string());

    // A connection inhabits at most one room.
    leave_current_room(&state, player_id).await;

    let code = loop {
        let candidate = random_code();
        match state.rooms.entry(candidate.clone()) {
            Entry::Occupied(_) => continue,
            Entry::Vacant(slot) => {
                slot.insert(Room::with_player(
                    candidate.clone(),
                    PlayerRecord {
                        id: player_id.to_string(),
                        username: username.clone(),
                    },
                ));
                break candidate;
            }
        }
    };

    if let Some(session) = state.players.get(player_id) {
        *session.room_code.write().await = Some(code.clone());
    }
    send_to_player(
        &state,
        player_id,
        ServerMessage::RoomCreated { code: code.clone() },
    );

    tracing::info!(player_id = %player_id, code = %code, username = %username, "Room created");
}

/// Join an existing room by code
pub async fn handle_join_room(
    state: Arc<AppState>,
    player_id: &str,
    code: &str,
    username: Option<String>,
) -> Result<(), GameError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(GameError::MalformedCommand("missing room code".to_string()));
    }
    let username = username.unwrap_or_else(|| "Guest".to_string());

    leave_current_room(&state, player_id).await;

    let max_players = state.config.game.max_players;
    let (player_count, topic, round_collected) = {
        let room = state
            .rooms
            .get(&code)
            .ok_or_else(|| GameError::RoomNotFound { code: code.clone() })?;
        let mut game = room.game.write().await;
        if game.players.len() >= max_players {
            return Err(GameError::RoomFull {
                code: code.clone(),
                max: max_players,
            });
        }
        game.players.push(PlayerRecord {
            id: player_id.to_string(),
            username: username.clone(),
        });
        (
            game.players.len(),
            game.current_topic.clone(),
            !game.round_answers.is_empty(),
        )
    };

    if let Some(session) = state.players.get(player_id) {
        *session.room_code.write().await = Some(code.clone());
    }

    // The topic rides along so a mid-round joiner renders the prompt
    // instead of a stale lobby view.
    send_to_player(
        &state,
        player_id,
        ServerMessage::RoomJoined {
            code: code.clone(),
            topic: topic.clone(),
        },
    );

    if player_count == MIN_PLAYERS {
        // A room below the minimum never survives a removal, so this
        // transition happens at most once per room.
        broadcast_to_room(&state, &code, ServerMessage::GameStart).await;
        if topic.is_none() && !round_collected {
            round::start_new_round(state.clone(), &code).await;
        } else if let Some(topic) = topic {
            send_to_player(&state, player_id, ServerMessage::NewRound { topic });
        }
    } else if let Some(topic) = topic {
        send_to_player(&state, player_id, ServerMessage::NewRound { topic });
    }

    tracing::info!(
        player_id = %player_id,
        code = %code,
        player_count = player_count,
        "Player joined room"
    );
    Ok(())
}

/// Explicit leave; the connection stays open
pub async fn handle_leave_room(state: Arc<AppState>, player_id: &str) {
    leave_current_room(&state, player_id).await;
}

/// Take the caller out of whatever room its session points at
async fn leave_current_room(state: &Arc<AppState>, player_id: &str) {
    let previous = match state.players.get(player_id) {
        Some(session) => session.room_code.write().await.take(),
        None => None,
    };
    if let Some(previous) = previous {
        leave_room_internal(state, player_id, &previous).await;
    }
}

/// Remove a player from a room and renormalize it: notify the remainder,
/// destroy the room below the minimum, otherwise re-check the round.
pub async fn leave_room_internal(state: &Arc<AppState>, player_id: &str, room_code: &str) {
    let removed = {
        let Some(room) = state.rooms.get(room_code) else {
            return;
        };
        let mut game = room.game.write().await;
        let Some(idx) = game.players.iter().position(|p| p.id == player_id) else {
            return;
        };
        let departed = game.players.remove(idx);
        game.round_answers.retain(|a| a.player_id != player_id);
        let roster: Vec<String> = game.players.iter().map(|p| p.username.clone()).collect();
        (departed.username, game.players.len(), roster)
    };
    let (username, remaining, roster) = removed;

    broadcast_to_room(
        state,
        room_code,
        ServerMessage::PlayerLeft {
            username: username.clone(),
            players: roster,
        },
    )
    .await;

    tracing::info!(
        player_id = %player_id,
        code = %room_code,
        username = %username,
        remaining = remaining,
        "Player left room"
    );

    if remaining < MIN_PLAYERS {
        broadcast_to_room(
            state,
            room_code,
            ServerMessage::GameStop {
                message: "Game over: not enough players left.".to_string(),
            },
        )
        .await;
        destroy_room(state, room_code).await;
        return;
    }

    // The denominator shrank: the round may have just completed, and if
    // not, the submitted players are waiting on fewer answers now.
    if !round::check_round_completion(state, room_code).await {
        round::update_waiting_status(state, room_code).await;
    }
}

/// Remove a room from the registry. Idempotent; aborts any scheduled
/// next-round timer and clears the members' session mappings.
pub async fn destroy_room(state: &AppState, code: &str) {
    let Some((_, room)) = state.rooms.remove(code) else {
        return;
    };
    if let Some(timer) = room.next_round_timer.lock().await.take() {
        timer.abort();
    }
    let game = room.game.read().await;
    for player in &game.players {
        if let Some(session) = state.players.get(&player.id) {
            *session.room_code.write().await = None;
        }
    }
    tracing::info!(code = %code, "Room destroyed");
}

/// Send one message to one connection
pub fn send_to_player(state: &AppState, player_id: &str, message: ServerMessage) {
    if let Some(session) = state.players.get(player_id) {
        let _ = session.sender.send(message);
    }
}

/// Send one message to every member of a room
pub async fn broadcast_to_room(state: &AppState, code: &str, message: ServerMessage) {
    let recipients: Vec<String> = {
        let Some(room) = state.rooms.get(code) else {
            return;
        };
        let game = room.game.read().await;
        game.players.iter().map(|p| p.id.clone()).collect()
    };
    for player_id in recipients {
        send_to_player(state, &player_id, message.clone());
    }
}

/// Destroy rooms that never gathered enough players. Rooms with a running
/// game are left alone; they die through membership loss only.
pub async fn cleanup_stale_lobbies(state: Arc<AppState>) {
    let timeout = Duration::from_millis(state.config.game.lobby_timeout_ms);
    let now = Instant::now();

    let candidates: Vec<String> = state
        .rooms
        .iter()
        .filter(|room| now.duration_since(room.created_at) >= timeout)
        .map(|room| room.key().clone())
        .collect();

    let mut swept = 0;
    for code in candidates {
        let stale = match state.rooms.get(&code) {
            Some(room) => room.game.read().await.players.len() < MIN_PLAYERS,
            None => false,
        };
        if stale {
            broadcast_to_room(
                &state,
                &code,
                ServerMessage::GameStop {
                    message: "Room closed: nobody joined.".to_string(),
                },
            )
            .await;
            destroy_room(&state, &code).await;
            swept += 1;
        }
    }

    if swept > 0 {
        tracing::info!(swept_rooms = swept, "Stale lobby cleanup completed");
    }
}
