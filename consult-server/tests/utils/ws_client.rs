use consult_core::{ClientMessage, ServerMessage};
use consult_server::{AppState, HeaderIdentity, ServerConfig, router};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves the full router on an ephemeral port.
pub async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(&config, Arc::new(HeaderIdentity));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

pub async fn connect_as(
    addr: SocketAddr,
    user_id: Option<&str>,
) -> Result<TestSocket, tokio_tungstenite::tungstenite::Error> {
    let mut request = format!("ws://{addr}/ws").into_client_request()?;
    if let Some(user_id) = user_id {
        request
            .headers_mut()
            .insert("x-user-id", HeaderValue::from_str(user_id).unwrap());
    }

    let (socket, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(socket)
}

pub async fn send(socket: &mut TestSocket, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    socket.send(Message::Text(json.into())).await.unwrap();
}

pub async fn send_raw(socket: &mut TestSocket, text: &str) {
    socket
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Next server frame, failing the test after two seconds of silence.
pub async fn recv(socket: &mut TestSocket) -> ServerMessage {
    let deadline = Duration::from_secs(2);
    loop {
        let frame = tokio::time::timeout(deadline, socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");

        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("valid server frame");
        }
    }
}

/// Reads frames until one matches, returning it.
pub async fn recv_until<F>(socket: &mut TestSocket, predicate: F) -> ServerMessage
where
    F: Fn(&ServerMessage) -> bool,
{
    loop {
        let msg = recv(socket).await;
        if predicate(&msg) {
            return msg;
        }
    }
}
