//! Connection handlers

use crate::protocol::ServerMessage;
use crate::state::{AppState, PlayerSession};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use uuid::Uuid;

/// Register a new connection and hand back its handle
pub async fn handle_connection(
    state: Arc<AppState>,
    sender: UnboundedSender<ServerMessage>,
) -> String {
    let player_id = Uuid::new_v4().to_string();

    let session = PlayerSession {
        id: player_id.clone(),
        room_code: RwLock::new(None),
        sender: sender.clone(),
        connected_at: Instant::now(),
    };

    state.players.insert(player_id.clone(), session);

    let _ = sender.send(ServerMessage::Connected {
        socket_id: player_id.clone(),
    });

    tracing::info!(player_id = %player_id, "New connection established");
    player_id
}

/// Tear down a closed connection, leaving its room if it was in one
pub async fn handle_disconnect(state: Arc<AppState>, player_id: &str) {
    if let Some((_, session)) = state.players.remove(player_id) {
        let room_code = session.room_code.read().await.clone();
        if let Some(room_code) = room_code {
            crate::handlers::room::leave_room_internal(&state, player_id, &room_code).await;
        }
    }
    tracing::info!(player_id = %player_id, "Connection closed");
}

/// Transport keepalive
pub fn handle_heartbeat(sender: &UnboundedSender<ServerMessage>) {
    let _ = sender.send(ServerMessage::HeartbeatAck);
}
