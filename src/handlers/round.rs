//! Round progression: topic draw, answer collection, completion, reveal
//!
//! Per room the round state machine is NoRound -> Collecting -> Revealing,
//! looping back to Collecting after the reveal pause, until membership
//! drops below the minimum and the room is destroyed.

use crate::handlers::room::{broadcast_to_room, destroy_room, send_to_player};
use crate::protocol::{RevealedAnswer, ServerMessage};
use crate::state::{AppState, SubmittedAnswer, MIN_PLAYERS};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const TOPICS: &[&str] = &[
    "Favorite ice cream flavor",
    "A pet",
    "Pizza topping",
    "Travel destination",
    "A superhero",
    "Car brand",
    "A color",
    "Something round",
    "A reason to break up",
    "Something in the fridge",
    "A hobby",
    "An app",
    "Something people forget on vacation",
];

/// Independent uniform draw; repeats across rounds are allowed.
fn pick_topic() -> String {
    let idx = rand::thread_rng().gen_range(0..TOPICS.len());
    TOPICS[idx].to_string()
}

/// Begin a new collecting phase for a room.
///
/// Also the target of the scheduled reveal timer, so it re-validates
/// liveness: the room may have been destroyed mid-delay, possibly with
/// its code already reused.
pub async fn start_new_round(state: Arc<AppState>, code: &str) {
    let topic = {
        let Some(room) = state.rooms.get(code) else {
            tracing::debug!(code = %code, "Round start skipped, room is gone");
            return;
        };
        let mut game = room.game.write().await;
        if game.players.len() < MIN_PLAYERS {
            None
        } else {
            let topic = pick_topic();
            game.round_answers.clear();
            game.current_topic = Some(topic.clone());
            Some(topic)
        }
    };

    match topic {
        Some(topic) => {
            tracing::info!(code = %code, topic = %topic, "New round started");
            broadcast_to_room(&state, code, ServerMessage::NewRound { topic }).await;
        }
        None => {
            broadcast_to_room(
                &state,
                code,
                ServerMessage::GameStop {
                    message: "Not enough players for a new round.".to_string(),
                },
            )
            .await;
            destroy_room(&state, code).await;
        }
    }
}

/// Record the caller's answer for the running round.
///
/// Defined no-ops, not errors: roomless caller, vanished room, non-member,
/// no round collecting, or a repeated submission this round.
pub async fn handle_submit_answer(state: Arc<AppState>, player_id: &str, term: String) {
    let room_code = match state.players.get(player_id) {
        Some(session) => session.room_code.read().await.clone(),
        None => None,
    };
    let Some(code) = room_code else {
        tracing::debug!(player_id = %player_id, "Answer submitted outside a room");
        return;
    };

    let recorded = {
        let Some(room) = state.rooms.get(&code) else {
            return;
        };
        let mut game = room.game.write().await;
        let Some(username) = game.username_of(player_id) else {
            return;
        };
        if game.current_topic.is_none() {
            tracing::debug!(player_id = %player_id, code = %code, "Answer with no round collecting");
            false
        } else if game.has_answered(player_id) {
            tracing::debug!(player_id = %player_id, code = %code, "Repeated submission ignored");
            false
        } else {
            game.round_answers.push(SubmittedAnswer {
                player_id: player_id.to_string(),
                username,
                term,
            });
            true
        }
    };
    if !recorded {
        return;
    }

    update_waiting_status(&state, &code).await;
    check_round_completion(&state, &code).await;
}

/// Tell everyone who already answered how many answers are still out
pub async fn update_waiting_status(state: &AppState, code: &str) {
    let (remaining, submitted) = {
        let Some(room) = state.rooms.get(code) else {
            return;
        };
        let game = room.game.read().await;
        let submitted: Vec<String> = game
            .round_answers
            .iter()
            .map(|a| a.player_id.clone())
            .collect();
        (game.remaining_count(), submitted)
    };
    for player_id in submitted {
        send_to_player(
            state,
            &player_id,
            ServerMessage::WaitingForOpponent { count: remaining },
        );
    }
}

/// Reveal the round if every current player has answered.
///
/// Returns whether the round completed. On completion the reveal is
/// broadcast and the next round is scheduled after the reveal pause.
pub async fn check_round_completion(state: &Arc<AppState>, code: &str) -> bool {
    let reveal = {
        let Some(room) = state.rooms.get(code) else {
            return false;
        };
        let game = room.game.read().await;
        if !game.is_complete() {
            return false;
        }
        let Some(topic) = game.current_topic.clone() else {
            return false;
        };
        let answers: Vec<RevealedAnswer> = game
            .round_answers
            .iter()
            .map(|a| RevealedAnswer {
                username: a.username.clone(),
                term: a.term.clone(),
            })
            .collect();
        (topic, answers)
    };

    let (topic, answers) = reveal;
    tracing::info!(code = %code, topic = %topic, answers = answers.len(), "Round complete, revealing");
    broadcast_to_room(state, code, ServerMessage::RoundReveal { topic, answers }).await;
    schedule_next_round(state, code).await;
    true
}

/// Arm the reveal-to-next-round timer for a room
async fn schedule_next_round(state: &Arc<AppState>, code: &str) {
    let delay = Duration::from_millis(state.config.game.reveal_duration_ms);
    let task_state = state.clone();
    let task_code = code.to_string();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        start_new_round(task_state, &task_code).await;
    });

    let Some(room) = state.rooms.get(code) else {
        // Room vanished between reveal and scheduling; the task would
        // no-op anyway, killing it just saves the sleep.
        handle.abort();
        return;
    };
    // A round completed during the reveal pause (a mid-pause joiner can
    // re-complete it) replaces the pending timer, one next round only.
    let old = room
        .next_round_timer
        .lock()
        .await
        .replace(handle.abort_handle());
    if let Some(old) = old {
        old.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_topic_draws_from_the_list() {
        for _ in 0..50 {
            let topic = pick_topic();
            assert!(TOPICS.contains(&topic.as_str()));
        }
    }
}
