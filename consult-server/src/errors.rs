use consult_core::{ErrorCode, RoomId};
use thiserror::Error;

/// Failures scoped to one room or one connection. None of them is fatal to
/// the relay.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("not a member of room {0}")]
    NotInRoom(RoomId),

    #[error("room {room_id} is full ({capacity} members)")]
    RoomFull { room_id: RoomId, capacity: usize },

    #[error("room {0} shut down while handling the request")]
    RoomClosed(RoomId),
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RegistryError::NotInRoom(_) => ErrorCode::NotInRoom,
            RegistryError::RoomFull { .. } => ErrorCode::RoomFull,
            RegistryError::RoomClosed(_) => ErrorCode::Internal,
        }
    }
}
