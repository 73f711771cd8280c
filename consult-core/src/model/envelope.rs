use crate::model::connection::ConnectionId;
use crate::model::identity::MemberInfo;
use crate::model::room::RoomId;
use crate::model::signaling::{IceCandidate, ServerMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Negotiation payload. The relay never looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate(IceCandidate),
}

impl SignalPayload {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalPayload::Offer { .. } => SignalKind::Offer,
            SignalPayload::Answer { .. } => SignalKind::Answer,
            SignalPayload::IceCandidate(_) => SignalKind::IceCandidate,
        }
    }
}

/// A negotiation message in flight between two members of a room.
///
/// `to == None` means "everyone in the room except the sender".
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEnvelope {
    pub room_id: RoomId,
    pub from: ConnectionId,
    pub to: Option<ConnectionId>,
    pub payload: SignalPayload,
}

impl SignalEnvelope {
    pub fn kind(&self) -> SignalKind {
        self.payload.kind()
    }

    /// Wire form as seen by the recipient, stamped with the sender's
    /// membership.
    pub fn to_server_message(&self, from: MemberInfo) -> ServerMessage {
        let room_id = self.room_id.clone();
        match &self.payload {
            SignalPayload::Offer { sdp } => ServerMessage::Offer {
                room_id,
                sdp: sdp.clone(),
                from,
            },
            SignalPayload::Answer { sdp } => ServerMessage::Answer {
                room_id,
                sdp: sdp.clone(),
                from,
            },
            SignalPayload::IceCandidate(candidate) => ServerMessage::IceCandidate {
                room_id,
                candidate: candidate.clone(),
                from,
            },
        }
    }
}

/// Presence-only broadcast: reaches every other member, never triggers
/// renegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    VideoToggled { enabled: bool },
    AudioToggled { enabled: bool },
    ScreenShare { sharing: bool },
    CallEnded,
}

impl Notice {
    pub fn to_server_message(self, room_id: RoomId, from: MemberInfo) -> ServerMessage {
        match self {
            Notice::VideoToggled { enabled } => ServerMessage::UserToggleVideo {
                room_id,
                from,
                enabled,
            },
            Notice::AudioToggled { enabled } => ServerMessage::UserToggleAudio {
                room_id,
                from,
                enabled,
            },
            Notice::ScreenShare { sharing } => ServerMessage::UserScreenShare {
                room_id,
                from,
                sharing,
            },
            Notice::CallEnded => ServerMessage::CallEnded { room_id, from },
        }
    }
}
