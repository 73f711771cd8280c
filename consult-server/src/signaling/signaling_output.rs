use async_trait::async_trait;
use consult_core::{ConnectionId, ServerMessage};

/// Delivery side of the relay: whatever owns the client sockets implements
/// this so rooms can reach their members.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a frame for one connection. Returns `false` when the
    /// connection is no longer reachable; that is never an error for the
    /// caller.
    async fn deliver(&self, connection_id: &ConnectionId, message: ServerMessage) -> bool;
}
