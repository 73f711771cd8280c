use crate::errors::RegistryError;
use crate::room::room::{Room, RoomHandle, RoomSettings};
use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use consult_core::{ConnectionId, Identity, MemberInfo, Notice, RoomId, SignalEnvelope};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Owns every live room and which rooms each connection belongs to.
///
/// Callers never touch membership directly; each operation is turned into a
/// command for the room's actor. Rooms are spawned by the first join and
/// retire on their own once empty.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    memberships: Arc<DashMap<ConnectionId, HashSet<RoomId>>>,
    generations: Arc<AtomicU64>,
    settings: RoomSettings,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
            settings,
            signaling,
        }
    }

    /// Adds the connection to the room, creating the room if needed.
    ///
    /// Joining a room twice is harmless: the joiner is re-sent its
    /// `room-joined` and nobody else hears about it.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        identity: Identity,
    ) -> Result<MemberInfo, RegistryError> {
        self.memberships
            .entry(connection_id)
            .or_default()
            .insert(room_id.clone());

        let (reply, reply_rx) = oneshot::channel();
        let cmd = RoomCommand::Join {
            connection_id,
            identity,
            reply,
        };

        let result = match self.send_or_spawn(room_id, cmd) {
            Ok(()) => reply_rx
                .await
                .unwrap_or_else(|_| Err(RegistryError::RoomClosed(room_id.clone()))),
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.forget_membership(&connection_id, room_id);
        }
        result
    }

    pub fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) {
        self.forget_membership(&connection_id, room_id);

        if let Err(e) = self.send_existing(room_id, RoomCommand::Leave { connection_id }) {
            debug!(%room_id, %connection_id, "Leave ignored: {}", e);
        }
    }

    /// Implicit leave from every room the connection is in.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let Some((_, rooms)) = self.memberships.remove(&connection_id) else {
            return;
        };

        info!(%connection_id, rooms = rooms.len(), "Disconnecting from rooms");

        for room_id in rooms {
            let _ = self.send_existing(&room_id, RoomCommand::Disconnect { connection_id });
        }
    }

    pub fn relay(&self, envelope: SignalEnvelope) -> Result<(), RegistryError> {
        let room_id = envelope.room_id.clone();
        self.send_existing(&room_id, RoomCommand::Relay { envelope })
    }

    pub fn notify(
        &self,
        room_id: &RoomId,
        from: ConnectionId,
        notice: Notice,
    ) -> Result<(), RegistryError> {
        self.send_existing(room_id, RoomCommand::Notify { from, notice })
    }

    /// Tells the rest of the room the call is over, then leaves.
    pub fn end_call(&self, room_id: &RoomId, from: ConnectionId) -> Result<(), RegistryError> {
        self.notify(room_id, from, Notice::CallEnded)?;
        self.leave(room_id, from);
        Ok(())
    }

    pub async fn members(&self, room_id: &RoomId) -> Vec<MemberInfo> {
        let (reply, reply_rx) = oneshot::channel();
        if self
            .send_existing(room_id, RoomCommand::Snapshot { reply })
            .is_err()
        {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.memberships
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget_membership(&self, connection_id: &ConnectionId, room_id: &RoomId) {
        if let Some(mut rooms) = self.memberships.get_mut(connection_id) {
            rooms.remove(room_id);
        }
        self.memberships
            .remove_if(connection_id, |_, rooms| rooms.is_empty());
    }

    /// Commands are pushed while the map entry is held, which is what lets
    /// a room retire without losing anything queued behind its last leave.
    fn send_or_spawn(&self, room_id: &RoomId, cmd: RoomCommand) -> Result<(), RegistryError> {
        let handle = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| self.spawn_room(room_id));

        handle
            .tx
            .send(cmd)
            .map_err(|_| RegistryError::RoomClosed(room_id.clone()))
    }

    fn send_existing(&self, room_id: &RoomId, cmd: RoomCommand) -> Result<(), RegistryError> {
        let Some(handle) = self.rooms.get(room_id) else {
            return Err(RegistryError::NotInRoom(room_id.clone()));
        };

        handle
            .tx
            .send(cmd)
            .map_err(|_| RegistryError::RoomClosed(room_id.clone()))
    }

    fn spawn_room(&self, room_id: &RoomId) -> RoomHandle {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        info!(%room_id, generation, "Creating new room");

        let room = Room::new(
            room_id.clone(),
            generation,
            self.settings,
            rx,
            self.rooms.clone(),
            self.signaling.clone(),
        );
        tokio::spawn(room.run());

        RoomHandle { tx, generation }
    }
}
