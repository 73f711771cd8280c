use super::{CallEvent, CallSession, CallState, EndReason};
use consult_core::ClientMessage;
use tracing::{debug, info};

impl CallSession {
    /// Explicit hang-up: the room is told the call is over.
    pub async fn hang_up(&mut self) {
        if self.state.is_ended() {
            debug!(room_id = %self.config.room_id, "Hang-up on an ended call ignored");
            return;
        }

        if self.joined {
            // The server broadcasts call-ended and takes us out of the room.
            self.send_signal(ClientMessage::EndCall {
                room_id: self.config.room_id.clone(),
            });
            self.joined = false;
        }
        self.end(EndReason::LocalHangUp).await;
    }

    /// The hosting view is going away.
    pub async fn teardown(&mut self) {
        self.end(EndReason::ViewClosed).await;
    }

    /// Moves to `Ended` and releases everything. Safe to call any number of
    /// times; only the first call has an effect.
    pub async fn end(&mut self, reason: EndReason) {
        if self.state.is_ended() {
            debug!(room_id = %self.config.room_id, ?reason, "Call already ended");
            return;
        }

        info!(room_id = %self.config.room_id, ?reason, "Ending call");
        self.end_reason = Some(reason);
        self.set_state(CallState::Ended);
        self.release().await;
        self.emit(CallEvent::Ended(reason));
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }
        self.screen_sharing = false;

        if let Some(stream) = self.local_stream.take() {
            stream.stop();
        }

        if let Some(peer) = self.peer.take() {
            if let Err(e) = peer.close().await {
                debug!(room_id = %self.config.room_id, "Peer close reported: {}", e);
            }
        }
        self.offer_pending = false;
        self.remote_description_set = false;

        if self.joined {
            self.joined = false;
            self.send_signal(ClientMessage::LeaveRoom {
                room_id: self.config.room_id.clone(),
            });
        }

        if !self.pending_candidates.is_empty() {
            debug!(
                dropped = self.pending_candidates.len(),
                "Discarding buffered candidates"
            );
            self.pending_candidates.clear();
        }
    }
}
