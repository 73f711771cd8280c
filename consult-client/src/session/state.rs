/// Call session lifecycle. `Ended` is terminal and reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AcquiringMedia,
    WaitingForPeer,
    Negotiating,
    Connected,
    Ended,
}

/// Coarse status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Connecting,
    Connected,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LocalHangUp,
    RemoteHangUp,
    PeerLeft,
    PeerFailed,
    PeerClosed,
    MediaUnavailable,
    RoomFull,
    TransportClosed,
    ViewClosed,
}

impl CallState {
    pub fn status(self) -> CallStatus {
        match self {
            CallState::Connected => CallStatus::Connected,
            CallState::Ended => CallStatus::Ended,
            _ => CallStatus::Connecting,
        }
    }

    pub fn is_ended(self) -> bool {
        self == CallState::Ended
    }

    pub fn can_advance_to(self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Idle, AcquiringMedia)
                | (AcquiringMedia, WaitingForPeer)
                | (WaitingForPeer, Negotiating)
                | (Negotiating, Connected)
        ) || (next == Ended && self != Ended)
    }
}
