use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use packman_arcade::autopilot::Autopilot;
use packman_arcade::constants::{TICK_MS, TICK_SECONDS};
use packman_arcade::engine::{GameEngine, GameEngineOptions};
use packman_arcade::error::ConfigError;
use packman_arcade::high_score_store::HighScoreStore;
use packman_arcade::maze::MazeBlueprint;
use packman_arcade::server_protocol::{parse_client_message, ParsedClientMessage};
use packman_arcade::types::{RuntimeEvent, TickInput};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    engine: GameEngine,
    pending: TickInput,
    autopilot: Option<Autopilot>,
    autopilot_seed: u32,
    persisted_best: u32,
    high_score_tx: mpsc::UnboundedSender<u32>,
}

impl ServerState {
    fn new(
        engine: GameEngine,
        autopilot_seed: Option<u32>,
        high_score_tx: mpsc::UnboundedSender<u32>,
    ) -> Self {
        let persisted_best = engine.high_score();
        Self {
            clients: HashMap::new(),
            engine,
            pending: TickInput::default(),
            autopilot: autopilot_seed.map(Autopilot::new),
            autopilot_seed: autopilot_seed.unwrap_or(1),
            persisted_best,
            high_score_tx,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let high_score_path = std::env::var("HIGH_SCORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/high_score.json"));
    let maze_path = std::env::var("MAZE_PATH").ok().map(PathBuf::from);
    let autopilot_seed = parse_autopilot_env(std::env::var("AUTOPILOT").ok().as_deref());

    let store = HighScoreStore::new(high_score_path);
    info!(path = %store.path().display(), best = store.best(), "high score loaded");

    let engine = match build_engine(maze_path.as_deref(), store.best()) {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "failed to load maze");
            std::process::exit(1);
        }
    };

    let high_score_tx = start_high_score_writer(store);
    let state = Arc::new(Mutex::new(ServerState::new(
        engine,
        autopilot_seed,
        high_score_tx,
    )));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static client");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found, serving websocket only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    info!(port, autopilot = autopilot_seed.is_some(), "listening");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn build_engine(maze_path: Option<&Path>, high_score: u32) -> Result<GameEngine, ConfigError> {
    let blueprint = match maze_path {
        Some(path) => MazeBlueprint::load_file(path)?,
        None => MazeBlueprint::classic(),
    };
    GameEngine::new(
        &blueprint,
        GameEngineOptions {
            high_score,
            ..GameEngineOptions::default()
        },
    )
}

/// `AUTOPILOT=1` (or `true`) turns on attract mode with seed 1; a number
/// above one is taken as the seed.
fn parse_autopilot_env(raw: Option<&str>) -> Option<u32> {
    let value = raw?.trim().to_ascii_lowercase();
    match value.as_str() {
        "" | "0" | "false" | "off" => None,
        "true" | "on" => Some(1),
        other => other.parse::<u32>().ok().filter(|seed| *seed > 0),
    }
}

fn start_high_score_writer(mut store: HighScoreStore) -> mpsc::UnboundedSender<u32> {
    let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
    tokio::task::spawn_blocking(move || {
        while let Some(score) = rx.blocking_recv() {
            if store.record(score) {
                info!(score, "high score saved");
            }
        }
    });
    tx
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome(&mut guard, &client_id);
    }
    info!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    let mut guard = state.lock().await;
                    send_error_to_client(&mut guard, &client_id, "invalid utf8 message");
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let mut guard = state.lock().await;
        handle_client_message(&mut guard, &client_id, &raw);
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
    }
    info!(client = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

fn handle_client_message(state: &mut ServerState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Input { dir } => {
            state.pending.dir = Some(dir);
        }
        ParsedClientMessage::Pause => {
            state.pending.toggle_pause = !state.pending.toggle_pause;
        }
        ParsedClientMessage::Restart => {
            state.pending.restart = true;
        }
        ParsedClientMessage::Autopilot { enabled } => {
            if enabled && state.autopilot.is_none() {
                state.autopilot = Some(Autopilot::new(state.autopilot_seed));
            } else if !enabled {
                state.autopilot = None;
            }
            info!(enabled, "autopilot toggled");
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn welcome_payload(state: &ServerState) -> Value {
    json!({
        "type": "welcome",
        "maze": state.engine.maze_init(),
        "config": state.engine.config,
        "highScore": state.engine.high_score(),
        "level": state.engine.level(),
        "autopilot": state.autopilot.is_some(),
    })
}

fn send_welcome(state: &mut ServerState, client_id: &str) {
    let welcome = welcome_payload(state);
    send_to_client(state, client_id, &welcome, QueuePolicy::DisconnectOnFull);
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    let mut input = std::mem::take(&mut state.pending);
    if let Some(autopilot) = state.autopilot.as_mut() {
        if state.engine.is_game_over() {
            input.restart = true;
        } else if let Some(dir) = autopilot.decide(&state.engine) {
            input.dir = Some(dir);
        }
    }

    state.engine.step(TICK_SECONDS, &input);
    let snapshot = state.engine.build_snapshot(true);

    let maze_reloaded = snapshot.events.iter().any(|event| {
        matches!(
            event,
            RuntimeEvent::LevelAdvanced { .. } | RuntimeEvent::Restarted
        )
    });
    let game_over = snapshot
        .events
        .iter()
        .any(|event| matches!(event, RuntimeEvent::GameOver { .. }));

    if maze_reloaded {
        let welcome = welcome_payload(state);
        broadcast(state, &welcome, QueuePolicy::DisconnectOnFull);
    }

    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if snapshot.high_score > state.persisted_best {
        state.persisted_best = snapshot.high_score;
        if state.high_score_tx.send(snapshot.high_score).is_err() {
            warn!("high score writer has stopped");
        }
    }

    if game_over {
        let summary = state.engine.build_summary();
        info!(
            score = summary.score,
            level = summary.level,
            ticks = summary.ticks,
            "game over"
        );
        broadcast(
            state,
            &json!({
                "type": "game_over",
                "summary": summary,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    let Some(client) = state.clients.remove(client_id) else {
        return;
    };
    warn!(client = %client_id, "client queue full, disconnecting");
    let _ = client.tx.try_send(OutboundMessage::Close {
        code: 1013,
        reason: "outbound queue full".to_string(),
    });
}

fn send_error_to_client(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use packman_arcade::types::Direction;

    fn test_state() -> (ServerState, mpsc::UnboundedReceiver<u32>) {
        let engine = build_engine(None, 0).expect("classic maze builds");
        let (tx, rx) = mpsc::unbounded_channel();
        (ServerState::new(engine, None, tx), rx)
    }

    fn connect(state: &mut ServerState) -> (String, mpsc::Receiver<OutboundMessage>) {
        let client_id = make_id("client");
        let (tx, rx) = mpsc::channel(64);
        state
            .clients
            .insert(client_id.clone(), ClientContext { tx });
        (client_id, rx)
    }

    fn drain_types(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<String> {
        let mut types = Vec::new();
        while let Ok(OutboundMessage::Text(payload)) = rx.try_recv() {
            let value: Value = serde_json::from_str(&payload).expect("payload is json");
            types.push(value["type"].as_str().unwrap_or_default().to_string());
        }
        types
    }

    #[test]
    fn autopilot_env_values() {
        assert_eq!(parse_autopilot_env(None), None);
        assert_eq!(parse_autopilot_env(Some("0")), None);
        assert_eq!(parse_autopilot_env(Some("false")), None);
        assert_eq!(parse_autopilot_env(Some("1")), Some(1));
        assert_eq!(parse_autopilot_env(Some("TRUE")), Some(1));
        assert_eq!(parse_autopilot_env(Some("42")), Some(42));
        assert_eq!(parse_autopilot_env(Some("banana")), None);
    }

    #[test]
    fn welcome_carries_maze_and_high_score() {
        let (state, _rx) = test_state();
        let welcome = welcome_payload(&state);
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["maze"]["width"], 28);
        assert_eq!(welcome["maze"]["height"], 31);
        assert_eq!(welcome["highScore"], 0);
        assert_eq!(welcome["autopilot"], false);
    }

    #[test]
    fn input_is_buffered_until_next_tick() {
        let (mut state, _rx) = test_state();
        let (client_id, mut client_rx) = connect(&mut state);

        handle_client_message(&mut state, &client_id, r#"{"type":"input","dir":"left"}"#);
        assert_eq!(state.pending.dir, Some(Direction::Left));

        tick_game(&mut state);
        assert_eq!(state.pending, TickInput::default());
        assert_eq!(state.engine.player().actor.dir, Direction::Left);
        assert_eq!(drain_types(&mut client_rx), vec!["state".to_string()]);
    }

    #[test]
    fn pause_toggles_and_invalid_messages_get_errors() {
        let (mut state, _rx) = test_state();
        let (client_id, mut client_rx) = connect(&mut state);

        handle_client_message(&mut state, &client_id, r#"{"type":"pause"}"#);
        tick_game(&mut state);
        assert!(state.engine.is_paused());

        handle_client_message(&mut state, &client_id, "nope");
        handle_client_message(&mut state, &client_id, r#"{"type":"ping","t":5}"#);
        assert_eq!(
            drain_types(&mut client_rx),
            vec!["state".to_string(), "error".to_string(), "pong".to_string()]
        );
    }

    #[test]
    fn autopilot_message_toggles_attract_mode() {
        let (mut state, _rx) = test_state();
        let (client_id, _client_rx) = connect(&mut state);

        handle_client_message(&mut state, &client_id, r#"{"type":"autopilot"}"#);
        assert!(state.autopilot.is_some());
        for _ in 0..30 {
            tick_game(&mut state);
        }
        assert_ne!(state.engine.player().actor.tile(), state.engine.maze().player_start());

        handle_client_message(&mut state, &client_id, r#"{"type":"autopilot","enabled":false}"#);
        assert!(state.autopilot.is_none());
    }

    #[test]
    fn new_high_scores_are_sent_to_the_writer() {
        let (mut state, mut rx) = test_state();
        state.pending.dir = Some(Direction::Left);
        for _ in 0..20 {
            tick_game(&mut state);
        }
        assert!(state.engine.score() > 0);
        let mut last = 0;
        while let Ok(score) = rx.try_recv() {
            assert!(score > last);
            last = score;
        }
        assert_eq!(last, state.engine.high_score());
        assert_eq!(state.persisted_best, last);
    }

    #[test]
    fn full_queue_disconnects_on_strict_policy() {
        let (mut state, _rx) = test_state();
        let client_id = make_id("client");
        let (tx, _client_rx) = mpsc::channel(1);
        state
            .clients
            .insert(client_id.clone(), ClientContext { tx });

        broadcast(&mut state, &json!({"type": "a"}), QueuePolicy::DropOnFull);
        broadcast(&mut state, &json!({"type": "b"}), QueuePolicy::DropOnFull);
        assert!(state.clients.contains_key(&client_id));

        broadcast(&mut state, &json!({"type": "c"}), QueuePolicy::DisconnectOnFull);
        assert!(!state.clients.contains_key(&client_id));
    }
}
