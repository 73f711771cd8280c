use super::{CallEvent, CallSession, CallState, EndReason};
use crate::error::PeerError;
use crate::peer::{PeerConnectionState, PeerEvents, RemoteTrack};
use async_trait::async_trait;
use consult_core::{ClientMessage, IceCandidate};
use tracing::{debug, info, warn};

#[async_trait]
impl PeerEvents for CallSession {
    /// Trickled to the counterpart as soon as it is discovered.
    async fn on_local_candidate(&mut self, candidate: IceCandidate) {
        if self.state.is_ended() || self.peer.is_none() {
            debug!("Local candidate from a destroyed peer connection discarded");
            return;
        }

        self.send_signal(ClientMessage::IceCandidate {
            room_id: self.config.room_id.clone(),
            candidate,
            to: self.remote_id(),
        });
    }

    async fn on_state_change(&mut self, state: PeerConnectionState) {
        if self.state.is_ended() {
            return;
        }
        debug!(room_id = %self.config.room_id, ?state, "Peer connection state");

        match state {
            PeerConnectionState::Connected => {
                if self.state == CallState::Negotiating {
                    self.was_connected = true;
                    self.set_state(CallState::Connected);
                    self.emit(CallEvent::Connected);
                }
            }
            PeerConnectionState::Failed => self.fail(PeerError::ConnectionFailed.into()).await,
            PeerConnectionState::Closed => self.on_close().await,
            PeerConnectionState::Disconnected => {
                warn!(room_id = %self.config.room_id, "Media path interrupted, waiting for ICE");
            }
            PeerConnectionState::New | PeerConnectionState::Connecting => {}
        }
    }

    async fn on_remote_track(&mut self, track: RemoteTrack) {
        if self.state.is_ended() {
            return;
        }
        info!(track_id = %track.id, kind = %track.kind, "Remote track received");
        self.emit(CallEvent::RemoteTrack(track));
    }

    async fn on_error(&mut self, error: PeerError) {
        if self.state.is_ended() {
            return;
        }
        self.fail(error.into()).await;
    }

    async fn on_close(&mut self) {
        if self.state.is_ended() {
            return;
        }
        info!(room_id = %self.config.room_id, "Peer connection closed");
        self.emit(CallEvent::Status("The connection was closed.".to_string()));
        self.end(EndReason::PeerClosed).await;
    }
}
