//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{PlayerId, RoomHandle, Snapshot};
use crate::util::rate_limit::InputRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Player identity established by the session layer in front of us
    pub player: String,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<Uuid>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    if query.player.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing player").into_response();
    }

    let Some(room) = state.rooms.get(&room_id) else {
        warn!(room_id = %room_id, "WebSocket upgrade for unknown room");
        return (StatusCode::NOT_FOUND, "Room not found").into_response();
    };

    let player = PlayerId::from(query.player);
    info!(room_id = %room_id, player = %player, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, player, room))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, player: PlayerId, room: RoomHandle) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Subscribe before connecting so no snapshot slips between the two
    let snapshot_rx = room.subscribe();
    let initial = match room.connect(player.clone()).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(room_id = %room.id, player = %player, error = %e, "Failed to join room");
            return;
        }
    };

    let welcome = ServerMsg::Welcome {
        player: player.clone(),
        room_id: room.id,
        server_time: unix_millis(),
    };
    let greeting = [welcome, ServerMsg::Snapshot { state: initial }];
    for msg in &greeting {
        if let Err(e) = send_msg(&mut ws_sink, msg).await {
            error!(player = %player, error = %e, "Failed to send welcome");
            room.disconnect(player.clone()).await;
            return;
        }
    }

    run_session(&player, &room, ws_sink, ws_stream, snapshot_rx).await;

    room.disconnect(player.clone()).await;
    info!(room_id = %room.id, player = %player, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player: &PlayerId,
    room: &RoomHandle,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut snapshot_rx: broadcast::Receiver<Snapshot>,
) {
    let rate_limiter = InputRateLimiter::default();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMsg>(32);

    // Writer task: command replies and broadcast snapshots -> WebSocket
    let writer_player = player.clone();
    let writer_handle = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
                snapshot = snapshot_rx.recv() => match snapshot {
                    Ok(state) => ServerMsg::Snapshot { state },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(player = %writer_player, lagged_count = n, "Client lagged, skipping {} snapshots", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(player = %writer_player, "Snapshot channel closed");
                        break;
                    }
                },
            };

            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(player = %writer_player, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> room
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(player = %player, "Rate limited input message");
                    continue;
                }

                let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(player = %player, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                let reply = match client_msg.command() {
                    Some(command) => {
                        match room.command(player.clone(), command, unix_millis()).await {
                            Ok(Ok(_)) => ServerMsg::Ok,
                            Ok(Err(rejection)) => ServerMsg::Rejected {
                                reason: rejection.to_string(),
                            },
                            Err(e) => {
                                debug!(player = %player, error = %e, "Room closed");
                                break;
                            }
                        }
                    }
                    None => match client_msg {
                        ClientMsg::Ping { t } => ServerMsg::Pong { t },
                        _ => continue,
                    },
                };

                if reply_tx.send(reply).await.is_err() {
                    debug!(player = %player, "Writer task gone");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player = %player, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(player = %player, "Received ping/pong");
            }
            Ok(Message::Close(_)) => {
                info!(player = %player, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player = %player, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
