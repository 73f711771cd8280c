mod connection;
mod envelope;
mod identity;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use envelope::{Notice, SignalEnvelope, SignalKind, SignalPayload};
pub use identity::{Identity, MemberInfo, UserId};
pub use room::{ParseError, RoomId};
pub use signaling::{ClientMessage, ErrorCode, IceCandidate, IceServerConfig, ServerMessage};
