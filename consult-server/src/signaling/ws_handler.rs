use crate::app::AppState;
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use consult_core::{Identity, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let identity = match state.identity.identify(&headers).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Rejecting WebSocket upgrade: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let service = state.signaling.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, identity, service))
}

async fn handle_socket(socket: WebSocket, identity: Identity, service: SignalingService) {
    let (connection, outbound) = service.accept(identity);
    let connection_id = connection.id();
    info!(%connection_id, "New WebSocket connection");

    let (sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(write_frames(sender, outbound));

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => connection.handle_text(text.as_str()).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // The aborted task must be gone before release, or a join still in
    // flight could re-add the connection to a room.
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            let _ = send_task.await;
        }
    };

    service.release(connection_id);
    info!(%connection_id, "WebSocket disconnected");
}

async fn write_frames(
    mut sender: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = outbound.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
