use crate::peer::{PeerEvent, PeerRole, RemoteTrack};
use crate::session::state::{CallState, CallStatus, EndReason};
use consult_core::ServerMessage;

/// Lifecycle notifications for the hosting UI.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    StateChanged(CallState),
    LocalMediaReady { audio_only: bool },
    RoleAssigned(PeerRole),
    Connected,
    RemoteTrack(RemoteTrack),
    LocalVideoToggled(bool),
    LocalAudioToggled(bool),
    RemoteVideoToggled(bool),
    RemoteAudioToggled(bool),
    ScreenShareStarted,
    ScreenShareStopped,
    RemoteScreenShare(bool),
    Status(String),
    Ended(EndReason),
}

/// Actions requested by the hosting UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallCommand {
    ToggleVideo(bool),
    ToggleAudio(bool),
    StartScreenShare,
    StopScreenShare,
    HangUp,
}

/// Everything that can happen to a session, consumed by
/// [`CallSession::dispatch`](crate::CallSession::dispatch).
#[derive(Debug)]
pub enum SessionEvent {
    Server(ServerMessage),
    Command(CallCommand),
    Peer(PeerEvent),
    ScreenTrackEnded,
    TransportClosed,
    ViewClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSummary {
    pub status: CallStatus,
    pub role: Option<PeerRole>,
    pub end_reason: Option<EndReason>,
    pub was_connected: bool,
}
