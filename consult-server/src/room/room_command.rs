use crate::errors::RegistryError;
use consult_core::{ConnectionId, Identity, MemberInfo, Notice, SignalEnvelope};
use tokio::sync::oneshot;

/// Commands processed by a room, strictly in arrival order.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a connection; replies with its membership.
    Join {
        connection_id: ConnectionId,
        identity: Identity,
        reply: oneshot::Sender<Result<MemberInfo, RegistryError>>,
    },

    /// Voluntary leave (`leave-room` or `end-call`).
    Leave { connection_id: ConnectionId },

    /// The transport under this connection is gone.
    Disconnect { connection_id: ConnectionId },

    /// Offer / answer / ICE candidate on its way to the other member.
    Relay { envelope: SignalEnvelope },

    /// Presence-only notification to everyone but the sender.
    Notify {
        from: ConnectionId,
        notice: Notice,
    },

    /// Current members, ordered by join.
    Snapshot {
        reply: oneshot::Sender<Vec<MemberInfo>>,
    },
}
