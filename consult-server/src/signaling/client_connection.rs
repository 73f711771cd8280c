use crate::errors::RegistryError;
use crate::room::error_message;
use crate::signaling::SignalingService;
use consult_core::{
    ClientMessage, ConnectionId, ErrorCode, Identity, Notice, RoomId, ServerMessage,
    SignalEnvelope, SignalPayload,
};
use tracing::{debug, info, warn};

/// Server side of one authenticated socket.
///
/// Frames from the socket are handled one at a time through [`handle`],
/// which is what keeps a sender's signals in order on their way to the room.
///
/// [`handle`]: ClientConnection::handle
pub struct ClientConnection {
    id: ConnectionId,
    identity: Identity,
    service: SignalingService,
}

impl ClientConnection {
    pub(crate) fn new(id: ConnectionId, identity: Identity, service: SignalingService) -> Self {
        Self {
            id,
            identity,
            service,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Parses one text frame. Garbage is answered with an error frame and
    /// otherwise ignored.
    pub async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => {
                warn!(connection_id = %self.id, "Invalid ClientMessage: {}", e);
                self.reply(ServerMessage::Error {
                    code: ErrorCode::InvalidMessage,
                    message: e.to_string(),
                });
            }
        }
    }

    pub async fn handle(&self, msg: ClientMessage) {
        if !self.service.is_connected(&self.id) {
            debug!(connection_id = %self.id, "Dropping frame from a released connection");
            return;
        }
        let registry = self.service.registry();

        let result = match msg {
            ClientMessage::JoinRoom {
                room_id,
                participant_id,
            } => {
                info!(
                    connection_id = %self.id,
                    user_id = %self.identity.user_id,
                    participant_id = participant_id.as_deref().unwrap_or("-"),
                    "Joining room '{}'",
                    room_id
                );
                match registry.join(&room_id, self.id, self.identity.clone()).await {
                    // The room has already told the joiner.
                    Ok(_) | Err(RegistryError::RoomFull { .. }) => Ok(()),
                    Err(e) => Err(e),
                }
            }

            ClientMessage::LeaveRoom { room_id } => {
                registry.leave(&room_id, self.id);
                Ok(())
            }

            ClientMessage::Offer { room_id, sdp, to } => {
                self.relay(room_id, to, SignalPayload::Offer { sdp })
            }

            ClientMessage::Answer { room_id, sdp, to } => {
                self.relay(room_id, to, SignalPayload::Answer { sdp })
            }

            ClientMessage::IceCandidate {
                room_id,
                candidate,
                to,
            } => self.relay(room_id, to, SignalPayload::IceCandidate(candidate)),

            ClientMessage::ToggleVideo { room_id, enabled } => {
                registry.notify(&room_id, self.id, Notice::VideoToggled { enabled })
            }

            ClientMessage::ToggleAudio { room_id, enabled } => {
                registry.notify(&room_id, self.id, Notice::AudioToggled { enabled })
            }

            ClientMessage::ScreenShareStarted { room_id } => {
                registry.notify(&room_id, self.id, Notice::ScreenShare { sharing: true })
            }

            ClientMessage::ScreenShareStopped { room_id } => {
                registry.notify(&room_id, self.id, Notice::ScreenShare { sharing: false })
            }

            ClientMessage::EndCall { room_id } => {
                info!(connection_id = %self.id, "Call ended in room '{}'", room_id);
                registry.end_call(&room_id, self.id)
            }
        };

        if let Err(e) = result {
            self.report(e);
        }
    }

    fn relay(
        &self,
        room_id: RoomId,
        to: Option<ConnectionId>,
        payload: SignalPayload,
    ) -> Result<(), RegistryError> {
        let envelope = SignalEnvelope {
            room_id,
            from: self.id,
            to,
            payload,
        };
        debug!(connection_id = %self.id, kind = ?envelope.kind(), "Relaying signal");
        self.service.registry().relay(envelope)
    }

    fn report(&self, err: RegistryError) {
        debug!(connection_id = %self.id, "Soft failure: {}", err);
        self.reply(error_message(&err));
    }

    fn reply(&self, message: ServerMessage) {
        self.service.send_to(&self.id, message);
    }

    /// Stops delivery and leaves every room. Consumes the connection, so it
    /// runs once per socket.
    pub fn disconnect(self) {
        self.service.release(self.id);
    }
}
