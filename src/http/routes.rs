//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::game::Snapshot;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rooms", post(create_room_handler))
        .route("/rooms/:room_id", get(room_snapshot_handler))
        .route("/rooms/:room_id/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.client_origins))
        .with_state(state)
}

/// CORS for the configured origins (comma-separated CLIENT_ORIGIN), or any
/// origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<header::HeaderValue> = origins
        .iter()
        .filter_map(|s| s.parse::<header::HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    active_connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.active_rooms(),
        active_connections: state.rooms.total_connections(),
    })
}

// ============================================================================
// Room endpoints
// ============================================================================

#[derive(Serialize)]
struct CreateRoomResponse {
    room_id: Uuid,
    ws_path: String,
}

async fn create_room_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    let room = state.rooms.spawn(state.room_settings());
    info!(room_id = %room.id, "Room created");

    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: room.id,
            ws_path: format!("/rooms/{}/ws", room.id),
        }),
    )
}

async fn room_snapshot_handler(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Snapshot>, AppError> {
    let room = state
        .rooms
        .get(&room_id)
        .ok_or_else(|| AppError::NotFound(format!("room {room_id}")))?;

    let snapshot = room
        .snapshot()
        .await
        .map_err(|_| AppError::NotFound(format!("room {room_id}")))?;

    Ok(Json(snapshot))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
