mod cleanup_impl;
mod driver;
mod events;
mod media_control_impl;
mod negotiation_impl;
mod peer_events_impl;
mod server_message_impl;
mod state;

pub use driver::CallDriver;
pub use events::{CallCommand, CallEvent, CallSummary, SessionEvent};
pub use state::{CallState, CallStatus, EndReason};

use crate::config::SessionConfig;
use crate::media::{LocalStream, MediaDevices, MediaTrack};
use crate::peer::{PeerConnector, PeerEvent, PeerHandle, PeerRole};
use crate::signal_sink::SignalSink;
use consult_core::{ClientMessage, ConnectionId, IceCandidate, MemberInfo, RoomId};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One participant's side of a call.
///
/// All state lives here and is only touched through `&mut self`, one event
/// at a time; the driver never runs two handlers concurrently.
pub struct CallSession {
    config: SessionConfig,
    devices: Arc<dyn MediaDevices>,
    connector: Arc<dyn PeerConnector>,
    signals: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<CallEvent>,
    peer_events: mpsc::UnboundedSender<PeerEvent>,

    state: CallState,
    role: Option<PeerRole>,
    connection_id: Option<ConnectionId>,
    local_member: Option<MemberInfo>,
    remote: Option<MemberInfo>,
    joined: bool,
    was_connected: bool,

    local_stream: Option<LocalStream>,
    screen_track: Option<MediaTrack>,
    video_enabled: bool,
    audio_enabled: bool,
    screen_sharing: bool,

    peer: Option<Arc<dyn PeerHandle>>,
    /// Set before the connector is awaited; the only gate on peer creation.
    peer_created: bool,
    /// Our offer is out and no answer has been applied yet.
    offer_pending: bool,
    remote_description_set: bool,
    pending_candidates: VecDeque<(ConnectionId, IceCandidate)>,

    end_reason: Option<EndReason>,
    released: bool,
}

impl CallSession {
    pub fn new(
        config: SessionConfig,
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
        signals: Arc<dyn SignalSink>,
        events: mpsc::UnboundedSender<CallEvent>,
        peer_events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Self {
        Self {
            config,
            devices,
            connector,
            signals,
            events,
            peer_events,
            state: CallState::Idle,
            role: None,
            connection_id: None,
            local_member: None,
            remote: None,
            joined: false,
            was_connected: false,
            local_stream: None,
            screen_track: None,
            video_enabled: true,
            audio_enabled: true,
            screen_sharing: false,
            peer: None,
            peer_created: false,
            offer_pending: false,
            remote_description_set: false,
            pending_candidates: VecDeque::new(),
            end_reason: None,
            released: false,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.config.room_id
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn status(&self) -> CallStatus {
        self.state.status()
    }

    pub fn role(&self) -> Option<PeerRole> {
        self.role
    }

    pub fn remote(&self) -> Option<&MemberInfo> {
        self.remote.as_ref()
    }

    pub fn has_peer(&self) -> bool {
        self.peer.is_some()
    }

    pub fn local_stream(&self) -> Option<&LocalStream> {
        self.local_stream.as_ref()
    }

    pub fn screen_track(&self) -> Option<&MediaTrack> {
        self.screen_track.as_ref()
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen_sharing
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn summary(&self) -> CallSummary {
        CallSummary {
            status: self.status(),
            role: self.role,
            end_reason: self.end_reason,
            was_connected: self.was_connected,
        }
    }

    /// Single entry point for everything that happens to the session.
    pub async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Server(msg) => self.handle_server_message(msg).await,
            SessionEvent::Command(cmd) => self.handle_command(cmd).await,
            SessionEvent::Peer(evt) => evt.apply(self).await,
            SessionEvent::ScreenTrackEnded => self.on_screen_track_ended().await,
            SessionEvent::TransportClosed => self.end(EndReason::TransportClosed).await,
            SessionEvent::ViewClosed => self.teardown().await,
        }
    }

    pub async fn handle_command(&mut self, cmd: CallCommand) {
        let result = match cmd {
            CallCommand::ToggleVideo(enabled) => self.set_video_enabled(enabled),
            CallCommand::ToggleAudio(enabled) => self.set_audio_enabled(enabled),
            CallCommand::StartScreenShare => self.start_screen_share().await,
            CallCommand::StopScreenShare => self.stop_screen_share().await,
            CallCommand::HangUp => {
                self.hang_up().await;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(room_id = %self.config.room_id, "{:?} failed: {}", cmd, e);
            self.emit(CallEvent::Status(e.status_message()));
        }
    }

    fn set_state(&mut self, next: CallState) {
        if !self.state.can_advance_to(next) {
            debug!(from = ?self.state, to = ?next, "Ignoring state change");
            return;
        }
        info!(room_id = %self.config.room_id, from = ?self.state, to = ?next, "Call state changed");
        self.state = next;
        self.emit(CallEvent::StateChanged(next));
    }

    fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event);
    }

    fn send_signal(&self, message: ClientMessage) {
        if let Err(e) = self.signals.send(message) {
            debug!(room_id = %self.config.room_id, "Signal not sent: {}", e);
        }
    }

    fn remote_id(&self) -> Option<ConnectionId> {
        self.remote.as_ref().map(|m| m.connection_id)
    }

    /// Signals are only taken from the negotiated counterpart once one is
    /// known, and never from ourselves.
    fn is_counterpart(&self, from: &MemberInfo) -> bool {
        if Some(from.connection_id) == self.connection_id {
            return false;
        }
        match &self.remote {
            Some(remote) => remote.connection_id == from.connection_id,
            None => true,
        }
    }
}
