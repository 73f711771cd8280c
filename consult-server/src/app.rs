use crate::config::ServerConfig;
use crate::identity::IdentityProvider;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use consult_core::RoomId;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: &ServerConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            signaling: SignalingService::new(config),
            identity,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/rooms/{room_id}", get(room_members))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Lists a room's members. Only a current member of the room may ask.
async fn room_members(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let identity = match state.identity.identify(&headers).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Rejected room lookup: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let room_id: RoomId = match room_id.parse() {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let members = state.signaling.registry().members(&room_id).await;
    if !members.iter().any(|m| m.user_id == identity.user_id) {
        warn!(%room_id, user_id = %identity.user_id, "Room lookup by non-member");
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(members).into_response()
}
