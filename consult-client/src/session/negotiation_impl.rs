use super::{CallEvent, CallSession, CallState, EndReason};
use crate::error::CallError;
use crate::media::{LocalStream, MediaConstraints};
use crate::peer::{PeerConfig, PeerHandle, PeerRole};
use consult_core::{ClientMessage, IceCandidate, MemberInfo};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl CallSession {
    /// Acquires local media and announces presence in the room.
    pub async fn start(&mut self) -> Result<(), CallError> {
        if self.state != CallState::Idle {
            return Err(CallError::InvalidState {
                action: "start the call",
                state: self.state,
            });
        }
        self.set_state(CallState::AcquiringMedia);

        let stream = match self.acquire_media().await {
            Ok(stream) => stream,
            Err(e) => {
                error!(room_id = %self.config.room_id, "Media acquisition failed: {}", e);
                self.emit(CallEvent::Status(e.status_message()));
                self.end(EndReason::MediaUnavailable).await;
                return Err(e);
            }
        };

        let audio_only = stream.is_audio_only();
        self.video_enabled = !audio_only;
        self.local_stream = Some(stream);
        self.emit(CallEvent::LocalMediaReady { audio_only });

        self.send_signal(ClientMessage::JoinRoom {
            room_id: self.config.room_id.clone(),
            participant_id: self.config.participant_id.clone(),
        });
        self.joined = true;
        self.set_state(CallState::WaitingForPeer);
        Ok(())
    }

    async fn acquire_media(&self) -> Result<LocalStream, CallError> {
        match self.devices.user_media(MediaConstraints::AUDIO_VIDEO).await {
            Ok(stream) => Ok(stream),
            Err(e) if self.config.audio_only_fallback => {
                warn!("Camera and microphone unavailable ({}), retrying audio only", e);
                Ok(self.devices.user_media(MediaConstraints::AUDIO_ONLY).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The other participant arrived after us: we make the offer.
    pub(super) async fn on_peer_joined(&mut self, member: MemberInfo) {
        if Some(member.connection_id) == self.connection_id {
            return;
        }
        if self.peer_created || self.state != CallState::WaitingForPeer {
            debug!(
                connection_id = %member.connection_id,
                state = ?self.state,
                "Peer already negotiating, ignoring user-joined"
            );
            return;
        }

        info!(
            room_id = %self.config.room_id,
            user_id = %member.user_id,
            "Participant joined, initiating call"
        );
        self.remote = Some(member);
        self.assign_role(PeerRole::Initiator);

        if let Err(e) = self.send_offer().await {
            self.fail(e).await;
        }
    }

    async fn send_offer(&mut self) -> Result<(), CallError> {
        let peer = self.create_peer(PeerRole::Initiator).await?;
        let sdp = peer.create_offer().await?;
        self.offer_pending = true;

        self.send_signal(ClientMessage::Offer {
            room_id: self.config.room_id.clone(),
            sdp,
            to: self.remote_id(),
        });
        Ok(())
    }

    pub(super) async fn on_remote_offer(&mut self, sdp: String, from: MemberInfo) {
        if !self.is_counterpart(&from) {
            debug!(from = %from.connection_id, "Discarding offer from a non-counterpart");
            return;
        }

        if !self.peer_created {
            if self.state != CallState::WaitingForPeer {
                debug!(state = ?self.state, "Not ready for an offer, discarding");
                return;
            }
            info!(
                room_id = %self.config.room_id,
                user_id = %from.user_id,
                "Offer received, answering"
            );
            self.remote = Some(from.clone());
            self.assign_role(PeerRole::Responder);
            if let Err(e) = self.send_answer(sdp, &from).await {
                self.fail(e).await;
            }
            return;
        }

        if self.role == Some(PeerRole::Initiator) && self.offer_pending {
            if self.wins_glare(&from) {
                info!(
                    room_id = %self.config.room_id,
                    "Offers crossed; we joined first, keeping ours"
                );
                return;
            }

            info!(
                room_id = %self.config.room_id,
                "Offers crossed; the other side joined first, answering theirs"
            );
            self.offer_pending = false;
            self.assign_role(PeerRole::Responder);
            if let Err(e) = self.send_answer(sdp, &from).await {
                self.fail(e).await;
            }
            return;
        }

        debug!(from = %from.connection_id, "Duplicate offer discarded");
    }

    async fn send_answer(&mut self, sdp: String, from: &MemberInfo) -> Result<(), CallError> {
        let peer = match self.peer.clone() {
            Some(peer) => peer,
            None => self.create_peer(PeerRole::Responder).await?,
        };

        let answer = peer.accept_offer(sdp).await?;
        self.remote_description_set = true;

        self.send_signal(ClientMessage::Answer {
            room_id: self.config.room_id.clone(),
            sdp: answer,
            to: Some(from.connection_id),
        });

        self.replay_candidates().await;
        Ok(())
    }

    pub(super) async fn on_remote_answer(&mut self, sdp: String, from: MemberInfo) {
        if !self.is_counterpart(&from) || !self.offer_pending {
            debug!(from = %from.connection_id, "Discarding unexpected answer");
            return;
        }
        let Some(peer) = self.peer.clone() else {
            debug!("Answer for a destroyed peer connection discarded");
            return;
        };

        match peer.accept_answer(sdp).await {
            Ok(()) => {
                debug!(room_id = %self.config.room_id, "Answer applied");
                self.offer_pending = false;
                self.remote_description_set = true;
                self.replay_candidates().await;
            }
            Err(e) => self.fail(e.into()).await,
        }
    }

    pub(super) async fn on_remote_candidate(&mut self, candidate: IceCandidate, from: MemberInfo) {
        if !self.is_counterpart(&from) {
            debug!(from = %from.connection_id, "Discarding candidate from a non-counterpart");
            return;
        }

        let ready = self
            .peer
            .clone()
            .filter(|_| self.remote_description_set);

        match ready {
            Some(peer) => {
                if let Err(e) = peer.add_ice_candidate(candidate).await {
                    warn!(room_id = %self.config.room_id, "Failed to add ICE candidate: {}", e);
                }
            }
            None => {
                debug!(
                    buffered = self.pending_candidates.len() + 1,
                    "Peer connection not ready, buffering candidate"
                );
                self.pending_candidates
                    .push_back((from.connection_id, candidate));
            }
        }
    }

    /// Applies buffered candidates in arrival order. Candidates from anyone
    /// but the counterpart are dropped.
    async fn replay_candidates(&mut self) {
        let Some(peer) = self.peer.clone() else {
            return;
        };
        let remote = self.remote_id();
        let pending = std::mem::take(&mut self.pending_candidates);

        for (from, candidate) in pending {
            if Some(from) != remote {
                debug!(%from, "Dropping buffered candidate from a non-counterpart");
                continue;
            }
            if let Err(e) = peer.add_ice_candidate(candidate).await {
                warn!(room_id = %self.config.room_id, "Failed to add buffered candidate: {}", e);
            }
        }
    }

    /// Guarded by `peer_created`, which is set before anything is awaited.
    async fn create_peer(&mut self, role: PeerRole) -> Result<Arc<dyn PeerHandle>, CallError> {
        if self.peer_created {
            return Err(CallError::InvalidState {
                action: "create a second peer connection",
                state: self.state,
            });
        }
        self.peer_created = true;
        self.set_state(CallState::Negotiating);

        let local = self.local_stream.clone().unwrap_or_default();
        let config = PeerConfig {
            role,
            ice_servers: self.config.ice_servers.clone(),
        };

        let peer = self
            .connector
            .connect(config, &local, self.peer_events.clone())
            .await?;
        self.peer = Some(peer.clone());
        Ok(peer)
    }

    /// The member with the lower join sequence keeps its offer.
    fn wins_glare(&self, from: &MemberInfo) -> bool {
        match &self.local_member {
            Some(local) => local.joined_before(from),
            None => self
                .connection_id
                .is_some_and(|id| id < from.connection_id),
        }
    }

    fn assign_role(&mut self, role: PeerRole) {
        debug!(room_id = %self.config.room_id, ?role, "Role assigned");
        self.role = Some(role);
        self.emit(CallEvent::RoleAssigned(role));
    }

    pub(super) async fn fail(&mut self, err: CallError) {
        error!(room_id = %self.config.room_id, "Call failed: {}", err);
        self.emit(CallEvent::Status(err.status_message()));
        self.end(EndReason::PeerFailed).await;
    }
}
