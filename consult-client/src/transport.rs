//! WebSocket signaling client.
//!
//! Bridges one socket to a pair of channels so the call driver never sees
//! the wire format. Outbound frames are written by a single task, in order.

use crate::error::SignalError;
use consult_core::utils::{DISPLAY_NAME_HEADER, USER_ID_HEADER};
use consult_core::{ClientMessage, Identity, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, error, info, warn};

pub struct SignalingConnection {
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Opens the signaling socket, presenting `identity` the way the gateway
/// would.
///
/// Dropping every clone of `outbound` closes the socket; `inbound` ends when
/// the server goes away.
pub async fn connect(url: &str, identity: &Identity) -> Result<SignalingConnection, SignalError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| SignalError::Connect(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert(USER_ID_HEADER, header_value(&identity.user_id.0)?);
    headers.insert(DISPLAY_NAME_HEADER, header_value(&identity.display_name)?);

    let (socket, _) = connect_async(request)
        .await
        .map_err(|e| SignalError::Connect(e.to_string()))?;
    info!(%url, user_id = %identity.user_id, "Signaling socket connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (inbound_tx, inbound) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize client message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
        debug!("Signaling writer finished");
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid ServerMessage: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Signaling socket error: {}", e);
                    break;
                }
            }
        }
        debug!("Signaling reader finished");
    });

    Ok(SignalingConnection { outbound, inbound })
}

fn header_value(value: &str) -> Result<HeaderValue, SignalError> {
    HeaderValue::from_str(value).map_err(|e| SignalError::Connect(e.to_string()))
}
