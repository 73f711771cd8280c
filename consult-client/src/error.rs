use crate::media::MediaKind;
use crate::session::CallState;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to use the {0} was denied")]
    PermissionDenied(MediaKind),

    #[error("no {0} found")]
    DeviceNotFound(MediaKind),

    #[error("media source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("peer connection failed")]
    ConnectionFailed,

    #[error("no outgoing video sender on this connection")]
    NoVideoSender,

    #[error("webrtc error: {0}")]
    Rtc(#[from] webrtc::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("signaling channel closed")]
    Closed,

    #[error("could not reach signaling server: {0}")]
    Connect(String),
}

/// Everything that can go wrong in a call, from the session's point of view.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: CallState,
    },

    #[error("no camera track to control")]
    NoVideoTrack,

    #[error("the consultation room is full")]
    RoomFull,
}

impl CallError {
    /// Short text for the hosting UI.
    pub fn status_message(&self) -> String {
        match self {
            CallError::Media(MediaError::PermissionDenied(_)) => {
                "Camera or microphone access was denied.".to_string()
            }
            CallError::Media(MediaError::DeviceNotFound(kind)) => {
                format!("No {kind} was found.")
            }
            CallError::Media(MediaError::Unavailable(_)) => {
                "Could not start your camera or microphone.".to_string()
            }
            CallError::Peer(_) => "The connection to the other participant failed.".to_string(),
            CallError::Signal(_) => "Lost connection to the call service.".to_string(),
            CallError::InvalidState { action, .. } => format!("Cannot {action} right now."),
            CallError::NoVideoTrack => "Video is not available in an audio-only call.".to_string(),
            CallError::RoomFull => "This consultation already has two participants.".to_string(),
        }
    }
}
