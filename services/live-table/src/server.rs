//! WebSocket front end for the table.
//!
//! Every socket receives the full event stream. Inbound frames are either player commands or
//! messages relayed from the embedding frame.

use std::collections::BTreeSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use roulette_neo_execution::TableEvent;
use roulette_neo_types::roulette::IncomingMessage;
use roulette_neo_types::{BetType, Pocket};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::driver::{lock, publish, SharedTable};

#[derive(Clone)]
pub struct AppState {
    pub table: SharedTable,
    pub broadcaster: broadcast::Sender<TableEvent>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum PlayerCommand {
    PlaceBet {
        bet_type: BetType,
        numbers: BTreeSet<Pocket>,
        #[serde(default)]
        payout_ratio: Option<u64>,
    },
    Undo,
    Clear,
    SelectChip {
        value: u64,
    },
    SetAutoplay {
        enabled: bool,
    },
    SaveLayout,
    LoadLayout,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Command(PlayerCommand),
    Bridge(IncomingMessage),
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Current round, table and leaderboard, sent to a socket as it connects.
fn welcome(state: &AppState) -> Vec<TableEvent> {
    let table = lock(&state.table);
    vec![
        TableEvent::Round(table.engine().snapshot()),
        TableEvent::Table(table.view()),
        TableEvent::Leaderboard(table.leaderboard().entries.clone()),
    ]
}

fn send_event(tx: &mpsc::UnboundedSender<Message>, event: &TableEvent) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = tx.send(Message::Text(payload));
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    // Subscribe before the welcome so nothing published in between is missed.
    let mut broadcast_rx = state.broadcaster.subscribe();
    info!("client connected");

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    for event in welcome(&state) {
        send_event(&tx, &event);
    }

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => send_event(&tx, &event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "client lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<Inbound>(&text) {
                Ok(inbound) => handle_inbound(inbound, &state),
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("client disconnected");
    write_task.abort();
    broadcast_task.abort();
}

pub fn handle_inbound(inbound: Inbound, state: &AppState) {
    let events = {
        let mut table = lock(&state.table);
        match inbound {
            Inbound::Command(command) => {
                debug!(?command, "player command");
                match command {
                    PlayerCommand::PlaceBet {
                        bet_type,
                        numbers,
                        payout_ratio,
                    } => table.place_bet(bet_type, numbers, payout_ratio),
                    PlayerCommand::Undo => table.undo(),
                    PlayerCommand::Clear => table.clear(),
                    PlayerCommand::SelectChip { value } => table.select_chip(value),
                    PlayerCommand::SetAutoplay { enabled } => table.set_autoplay(enabled),
                    PlayerCommand::SaveLayout => table.save_layout(),
                    PlayerCommand::LoadLayout => table.load_layout(),
                }
            }
            Inbound::Bridge(message) => table.handle_bridge(message),
        }
    };
    publish(&state.broadcaster, events);
}
