use super::{CallEvent, CallSession, EndReason};
use crate::error::CallError;
use consult_core::{ErrorCode, ServerMessage};
use tracing::{debug, info, warn};

impl CallSession {
    pub async fn handle_server_message(&mut self, msg: ServerMessage) {
        if self.state.is_ended() {
            debug!(room_id = %self.config.room_id, "Session ended, dropping {:?}", msg);
            return;
        }

        match msg {
            ServerMessage::Welcome {
                connection_id,
                ice_servers,
            } => {
                debug!(%connection_id, "Signaling connection established");
                self.connection_id = Some(connection_id);
                if !ice_servers.is_empty() {
                    self.config.ice_servers = ice_servers;
                }
            }

            ServerMessage::RoomJoined {
                room_id,
                local,
                members,
            } => {
                if room_id != self.config.room_id {
                    return;
                }
                info!(
                    %room_id,
                    join_seq = local.join_seq,
                    present = members.len(),
                    "Joined room"
                );
                self.connection_id = Some(local.connection_id);
                self.local_member = Some(local);
                // Whoever is already here receives user-joined and makes the
                // offer; we wait for it.
            }

            ServerMessage::UserJoined { room_id, member } => {
                if room_id != self.config.room_id {
                    return;
                }
                self.on_peer_joined(member).await;
            }

            ServerMessage::UserLeft {
                room_id,
                connection_id,
                user_id,
            } => {
                if room_id != self.config.room_id || self.remote_id() != Some(connection_id) {
                    debug!(%connection_id, "Ignoring user-left for a non-counterpart");
                    return;
                }
                info!(%room_id, %user_id, "Other participant left");
                self.emit(CallEvent::Status("The other participant left the call.".to_string()));
                self.end(EndReason::PeerLeft).await;
            }

            ServerMessage::Offer { room_id, sdp, from } => {
                if room_id != self.config.room_id {
                    return;
                }
                self.on_remote_offer(sdp, from).await;
            }

            ServerMessage::Answer { room_id, sdp, from } => {
                if room_id != self.config.room_id {
                    return;
                }
                self.on_remote_answer(sdp, from).await;
            }

            ServerMessage::IceCandidate {
                room_id,
                candidate,
                from,
            } => {
                if room_id != self.config.room_id {
                    return;
                }
                self.on_remote_candidate(candidate, from).await;
            }

            ServerMessage::UserToggleVideo {
                room_id,
                from,
                enabled,
            } => {
                if room_id == self.config.room_id && self.is_counterpart(&from) {
                    self.emit(CallEvent::RemoteVideoToggled(enabled));
                }
            }

            ServerMessage::UserToggleAudio {
                room_id,
                from,
                enabled,
            } => {
                if room_id == self.config.room_id && self.is_counterpart(&from) {
                    self.emit(CallEvent::RemoteAudioToggled(enabled));
                }
            }

            ServerMessage::UserScreenShare {
                room_id,
                from,
                sharing,
            } => {
                if room_id == self.config.room_id && self.is_counterpart(&from) {
                    self.emit(CallEvent::RemoteScreenShare(sharing));
                }
            }

            ServerMessage::CallEnded { room_id, from } => {
                if room_id != self.config.room_id || !self.is_counterpart(&from) {
                    return;
                }
                info!(%room_id, user_id = %from.user_id, "Call ended by the other participant");
                self.emit(CallEvent::Status("The call has ended.".to_string()));
                self.end(EndReason::RemoteHangUp).await;
            }

            ServerMessage::DeliveryFailed { room_id, to, kind } => {
                // The other side may simply not be here yet.
                debug!(%room_id, ?to, ?kind, "Signal was not delivered");
            }

            ServerMessage::Error { code, message } => match code {
                ErrorCode::RoomFull => {
                    warn!(room_id = %self.config.room_id, "Room is full: {}", message);
                    self.emit(CallEvent::Status(CallError::RoomFull.status_message()));
                    self.end(EndReason::RoomFull).await;
                }
                _ => warn!(room_id = %self.config.room_id, ?code, "Server error: {}", message),
            },
        }
    }
}
