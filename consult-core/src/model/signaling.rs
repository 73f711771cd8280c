use crate::model::connection::ConnectionId;
use crate::model::identity::{MemberInfo, UserId};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// A trickled network path proposal, as produced by the browser/peer stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    InvalidMessage,
    NotInRoom,
    RoomFull,
    Internal,
}

/// Frames sent by a call client to the signaling server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_id: RoomId,
        participant_id: Option<String>,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Offer {
        room_id: RoomId,
        sdp: String,
        to: Option<ConnectionId>,
    },
    Answer {
        room_id: RoomId,
        sdp: String,
        to: Option<ConnectionId>,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: IceCandidate,
        to: Option<ConnectionId>,
    },
    ToggleVideo {
        room_id: RoomId,
        enabled: bool,
    },
    ToggleAudio {
        room_id: RoomId,
        enabled: bool,
    },
    ScreenShareStarted {
        room_id: RoomId,
    },
    ScreenShareStopped {
        room_id: RoomId,
    },
    EndCall {
        room_id: RoomId,
    },
}

impl ClientMessage {
    pub fn room_id(&self) -> &RoomId {
        match self {
            ClientMessage::JoinRoom { room_id, .. }
            | ClientMessage::LeaveRoom { room_id }
            | ClientMessage::Offer { room_id, .. }
            | ClientMessage::Answer { room_id, .. }
            | ClientMessage::IceCandidate { room_id, .. }
            | ClientMessage::ToggleVideo { room_id, .. }
            | ClientMessage::ToggleAudio { room_id, .. }
            | ClientMessage::ScreenShareStarted { room_id }
            | ClientMessage::ScreenShareStopped { room_id }
            | ClientMessage::EndCall { room_id } => room_id,
        }
    }
}

/// Frames sent by the signaling server to a call client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Welcome {
        connection_id: ConnectionId,
        ice_servers: Vec<IceServerConfig>,
    },
    /// Reply to `join-room`: the joiner's own membership plus everyone
    /// already in the room.
    RoomJoined {
        room_id: RoomId,
        local: MemberInfo,
        members: Vec<MemberInfo>,
    },
    UserJoined {
        room_id: RoomId,
        member: MemberInfo,
    },
    UserLeft {
        room_id: RoomId,
        connection_id: ConnectionId,
        user_id: UserId,
    },
    Offer {
        room_id: RoomId,
        sdp: String,
        from: MemberInfo,
    },
    Answer {
        room_id: RoomId,
        sdp: String,
        from: MemberInfo,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: IceCandidate,
        from: MemberInfo,
    },
    UserToggleVideo {
        room_id: RoomId,
        from: MemberInfo,
        enabled: bool,
    },
    UserToggleAudio {
        room_id: RoomId,
        from: MemberInfo,
        enabled: bool,
    },
    UserScreenShare {
        room_id: RoomId,
        from: MemberInfo,
        sharing: bool,
    },
    CallEnded {
        room_id: RoomId,
        from: MemberInfo,
    },
    /// A relayed signal reached nobody. Informational; the peer may still
    /// join shortly.
    DeliveryFailed {
        room_id: RoomId,
        to: Option<ConnectionId>,
        kind: crate::model::envelope::SignalKind,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}
