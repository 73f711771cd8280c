use crate::config::ServerConfig;
use crate::room::{RoomRegistry, RoomSettings};
use crate::signaling::{ClientConnection, SignalingOutput};
use async_trait::async_trait;
use consult_core::{ConnectionId, Identity, IceServerConfig, ServerMessage};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Outbound queue of every live connection. Each queue is drained by exactly
/// one writer, which keeps per-recipient delivery FIFO.
#[derive(Default)]
struct PeerDirectory {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

#[async_trait]
impl SignalingOutput for PeerDirectory {
    async fn deliver(&self, connection_id: &ConnectionId, message: ServerMessage) -> bool {
        let Some(peer) = self.peers.get(connection_id) else {
            debug!(%connection_id, "Dropping frame for disconnected peer");
            return false;
        };

        if peer.send(message).is_err() {
            debug!(%connection_id, "Peer outbound queue closed");
            return false;
        }
        true
    }
}

#[derive(Clone)]
pub struct SignalingService {
    directory: Arc<PeerDirectory>,
    registry: RoomRegistry,
    ice_servers: Arc<Vec<IceServerConfig>>,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        let directory = Arc::new(PeerDirectory::default());
        let settings = RoomSettings {
            capacity: config.max_room_members,
            report_delivery_failures: config.report_delivery_failures,
        };
        let registry = RoomRegistry::new(settings, directory.clone());

        Self {
            directory,
            registry,
            ice_servers: Arc::new(config.ice_servers.clone()),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.as_ref().clone()
    }

    /// Registers a freshly authenticated transport and greets it.
    ///
    /// The returned receiver yields every frame addressed to the connection,
    /// in order; the socket writer drains it.
    pub fn accept(
        &self,
        identity: Identity,
    ) -> (ClientConnection, mpsc::UnboundedReceiver<ServerMessage>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(ServerMessage::Welcome {
            connection_id,
            ice_servers: self.get_ice_servers(),
        });
        self.directory.peers.insert(connection_id, tx);

        info!(%connection_id, user_id = %identity.user_id, "Connection accepted");

        let connection = ClientConnection::new(connection_id, identity, self.clone());
        (connection, rx)
    }

    pub(crate) fn send_to(&self, connection_id: &ConnectionId, message: ServerMessage) {
        if let Some(peer) = self.directory.peers.get(connection_id) {
            let _ = peer.send(message);
        }
    }

    /// Stops delivery to the connection first, then leaves its rooms.
    pub fn release(&self, connection_id: ConnectionId) {
        self.directory.peers.remove(&connection_id);
        self.registry.disconnect(connection_id);
        info!(%connection_id, "Connection released");
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.directory.peers.contains_key(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.directory.peers.len()
    }
}
