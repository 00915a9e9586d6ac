//! WordClash game server binary

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordclash::config::Config;
use wordclash::handlers;
use wordclash::protocol::{ClientMessage, ServerMessage};
use wordclash::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(config.clone()));

    // Sweep lobbies whose second player never arrived
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            handlers::cleanup_stale_lobbies(cleanup_state.clone()).await;
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("WordClash game server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>WordClash Game Server</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "wordclash",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let player_id = handlers::handle_connection(state.clone(), tx.clone()).await;

    // Outbound pump: one task serializes this connection's event stream
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(&state, &player_id, &tx, msg).await,
                Err(err) => {
                    tracing::warn!(player_id = %player_id, error = %err, "Unparseable command");
                    let _ = tx.send(ServerMessage::Error {
                        code: "malformedCommand".to_string(),
                        message: format!("Malformed command: {err}"),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    handlers::handle_disconnect(state, &player_id).await;
    send_task.abort();
}

async fn handle_client_message(
    state: &Arc<AppState>,
    player_id: &str,
    sender: &mpsc::UnboundedSender<ServerMessage>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Heartbeat => {
            handlers::handle_heartbeat(sender);
        }
        ClientMessage::CreateRoom { username } => {
            handlers::handle_create_room(state.clone(), player_id, username).await;
        }
        ClientMessage::JoinRoom { code, username } => {
            if let Err(err) =
                handlers::handle_join_room(state.clone(), player_id, &code, username).await
            {
                tracing::warn!(player_id = %player_id, error = %err, "Join rejected");
                let _ = sender.send(ServerMessage::Error {
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }
        }
        ClientMessage::LeaveRoom => {
            handlers::handle_leave_room(state.clone(), player_id).await;
        }
        ClientMessage::SubmitAnswer { term } => {
            handlers::handle_submit_answer(state.clone(), player_id, term).await;
        }
    }
}
