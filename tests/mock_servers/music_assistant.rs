//! Mock Music Assistant server for testing
//!
//! Simulates the JSON command API at /api and records every command it
//! receives so tests can assert on the exact wire traffic.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Mock player state
#[derive(Debug, Clone)]
pub struct MockPlayer {
    pub player_id: String,
    pub display_name: String,
    pub state: String, // "playing", "paused", "idle"
    pub volume_level: i64,
}

/// A command as received by the mock
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub command: String,
    pub args: Value,
    pub authorization: Option<String>,
}

struct MockState {
    players: HashMap<String, MockPlayer>,
    /// Raw `music/search` response body
    search_response: Value,
    commands: Vec<RecordedCommand>,
}

/// Mock Music Assistant server
pub struct MockMusicAssistant {
    addr: SocketAddr,
    state: Arc<RwLock<MockState>>,
    handle: JoinHandle<()>,
}

impl MockMusicAssistant {
    /// Start a mock server on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockState {
            players: HashMap::new(),
            search_response: json!({}),
            commands: Vec::new(),
        }));

        let app = Router::new()
            .route("/api", post(handle_command))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_player(&self, player_id: &str, name: &str, volume_level: i64) {
        self.state.write().await.players.insert(
            player_id.to_string(),
            MockPlayer {
                player_id: player_id.to_string(),
                display_name: name.to_string(),
                state: "idle".to_string(),
                volume_level,
            },
        );
    }

    pub async fn player(&self, player_id: &str) -> Option<MockPlayer> {
        self.state.read().await.players.get(player_id).cloned()
    }

    pub async fn set_search_response(&self, response: Value) {
        self.state.write().await.search_response = response;
    }

    /// All commands received so far, in order
    pub async fn commands(&self) -> Vec<RecordedCommand> {
        self.state.read().await.commands.clone()
    }

    /// Commands received so far, excluding player lookups
    pub async fn mutating_commands(&self) -> Vec<RecordedCommand> {
        self.commands()
            .await
            .into_iter()
            .filter(|c| c.command != "players/get" && c.command != "players/all")
            .collect()
    }

    pub async fn stop(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Deserialize)]
struct CommandMessage {
    message_id: String,
    command: String,
    #[serde(default)]
    args: Value,
}

fn player_json(p: &MockPlayer) -> Value {
    json!({
        "player_id": p.player_id,
        "display_name": p.display_name,
        "available": true,
        "powered": true,
        "state": p.state,
        "volume_level": p.volume_level,
    })
}

async fn handle_command(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Json(message): Json<CommandMessage>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = state.write().await;
    state.commands.push(RecordedCommand {
        command: message.command.clone(),
        args: message.args.clone(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    });

    let player_id = message
        .args
        .get("player_id")
        .or_else(|| message.args.get("queue_id"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let result = match message.command.as_str() {
        "players/all" => Value::Array(state.players.values().map(player_json).collect()),
        "players/get" => match state.players.get(&player_id) {
            Some(p) => player_json(p),
            None => Value::Null,
        },
        "players/cmd/play" | "players/cmd/pause" | "players/cmd/stop" => {
            let new_state = match message.command.as_str() {
                "players/cmd/play" => "playing",
                "players/cmd/pause" => "paused",
                _ => "idle",
            };
            match state.players.get_mut(&player_id) {
                Some(p) => {
                    p.state = new_state.to_string();
                    Value::Null
                }
                None => return Ok(Json(unknown_player(&message.message_id, &player_id))),
            }
        }
        "players/cmd/next" | "players/cmd/previous" => Value::Null,
        "players/cmd/volume_set" => {
            let level = message
                .args
                .get("volume_level")
                .and_then(|v| v.as_i64())
                .ok_or(StatusCode::BAD_REQUEST)?;
            match state.players.get_mut(&player_id) {
                Some(p) => {
                    p.volume_level = level;
                    Value::Null
                }
                None => return Ok(Json(unknown_player(&message.message_id, &player_id))),
            }
        }
        "music/search" => state.search_response.clone(),
        "player_queues/play_media" => {
            if let Some(p) = state.players.get_mut(&player_id) {
                p.state = "playing".to_string();
            }
            Value::Null
        }
        _ => return Err(StatusCode::NOT_FOUND),
    };

    Ok(Json(json!({
        "message_id": message.message_id,
        "result": result,
    })))
}

fn unknown_player(message_id: &str, player_id: &str) -> Value {
    json!({
        "message_id": message_id,
        "error_code": 999,
        "details": format!("Player {} not found", player_id),
    })
}
