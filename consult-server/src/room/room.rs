use crate::errors::RegistryError;
use crate::room::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use consult_core::{
    ConnectionId, Identity, MemberInfo, Notice, RoomId, ServerMessage, SignalEnvelope,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Entry in the registry map. `generation` tells a retiring room apart from
/// a newer room that reused the same id.
#[derive(Debug)]
pub struct RoomHandle {
    pub(crate) tx: mpsc::UnboundedSender<RoomCommand>,
    pub(crate) generation: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    pub capacity: usize,
    pub report_delivery_failures: bool,
}

/// Actor owning the membership of one room.
///
/// Every mutation and every relay for the room passes through its single
/// mailbox, so the final membership is always the result of applying the
/// commands in the order they arrived.
pub struct Room {
    room_id: RoomId,
    generation: u64,
    settings: RoomSettings,
    members: HashMap<ConnectionId, MemberInfo>,
    next_join_seq: u64,
    command_rx: mpsc::UnboundedReceiver<RoomCommand>,
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        generation: u64,
        settings: RoomSettings,
        command_rx: mpsc::UnboundedReceiver<RoomCommand>,
        rooms: Arc<DashMap<RoomId, RoomHandle>>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            room_id,
            generation,
            settings,
            members: HashMap::new(),
            next_join_seq: 1,
            command_rx,
            rooms,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!(room_id = %self.room_id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.members.is_empty() && self.try_retire() {
                break;
            }
        }

        info!(room_id = %self.room_id, "Room event loop finished");
    }

    /// Drops the registry entry if nobody is left and nothing is queued.
    ///
    /// Senders only push into the mailbox while holding the map entry, so
    /// checking the mailbox under `remove_if` cannot miss a command.
    fn try_retire(&self) -> bool {
        let generation = self.generation;
        let mailbox = &self.command_rx;

        self.rooms
            .remove_if(&self.room_id, |_, handle| {
                handle.generation == generation && mailbox.is_empty()
            })
            .is_some()
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                identity,
                reply,
            } => {
                let result = self.join(connection_id, identity).await;
                let _ = reply.send(result);
            }

            RoomCommand::Leave { connection_id } => {
                self.remove_member(&connection_id).await;
            }

            RoomCommand::Disconnect { connection_id } => {
                info!(room_id = %self.room_id, %connection_id, "Connection dropped");
                self.remove_member(&connection_id).await;
            }

            RoomCommand::Relay { envelope } => self.relay(envelope).await,

            RoomCommand::Notify { from, notice } => self.notify(from, notice).await,

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.members_by_join());
            }
        }
    }

    async fn join(
        &mut self,
        connection_id: ConnectionId,
        identity: Identity,
    ) -> Result<MemberInfo, RegistryError> {
        if let Some(existing) = self.members.get(&connection_id).cloned() {
            debug!(room_id = %self.room_id, %connection_id, "Duplicate join ignored");
            let others = self.members_except(&connection_id);
            self.deliver(&connection_id, self.room_joined(existing.clone(), others))
                .await;
            return Ok(existing);
        }

        if self.members.len() >= self.settings.capacity {
            warn!(
                room_id = %self.room_id,
                %connection_id,
                capacity = self.settings.capacity,
                "Join rejected, room is full"
            );
            let err = RegistryError::RoomFull {
                room_id: self.room_id.clone(),
                capacity: self.settings.capacity,
            };
            self.deliver(&connection_id, error_message(&err)).await;
            return Err(err);
        }

        let member = MemberInfo {
            connection_id,
            user_id: identity.user_id,
            display_name: identity.display_name,
            join_seq: self.next_join_seq,
        };
        self.next_join_seq += 1;

        let existing = self.members_by_join();
        self.members.insert(connection_id, member.clone());

        info!(
            room_id = %self.room_id,
            %connection_id,
            user_id = %member.user_id,
            members = self.members.len(),
            "Member joined"
        );

        self.deliver(&connection_id, self.room_joined(member.clone(), existing.clone()))
            .await;

        for other in &existing {
            let notice = ServerMessage::UserJoined {
                room_id: self.room_id.clone(),
                member: member.clone(),
            };
            self.deliver(&other.connection_id, notice).await;
        }

        Ok(member)
    }

    async fn remove_member(&mut self, connection_id: &ConnectionId) {
        let Some(member) = self.members.remove(connection_id) else {
            return;
        };

        info!(
            room_id = %self.room_id,
            %connection_id,
            user_id = %member.user_id,
            members = self.members.len(),
            "Member left"
        );

        for other in self.members_by_join() {
            let notice = ServerMessage::UserLeft {
                room_id: self.room_id.clone(),
                connection_id: member.connection_id,
                user_id: member.user_id.clone(),
            };
            self.deliver(&other.connection_id, notice).await;
        }
    }

    /// Directed delivery when the target is a current member, broadcast to
    /// the rest of the room otherwise.
    async fn relay(&mut self, envelope: SignalEnvelope) {
        let Some(sender) = self.members.get(&envelope.from).cloned() else {
            debug!(room_id = %self.room_id, from = %envelope.from, "Relay from non-member rejected");
            let err = RegistryError::NotInRoom(self.room_id.clone());
            self.deliver(&envelope.from, error_message(&err)).await;
            return;
        };

        let message = envelope.to_server_message(sender);
        let direct = envelope
            .to
            .filter(|to| *to != envelope.from && self.members.contains_key(to));

        let delivered = match direct {
            Some(to) => usize::from(self.deliver(&to, message).await),
            None => {
                if let Some(to) = envelope.to {
                    debug!(room_id = %self.room_id, %to, "Target not in room, broadcasting");
                }
                self.broadcast_except(&envelope.from, message).await
            }
        };

        if delivered == 0 {
            debug!(
                room_id = %self.room_id,
                from = %envelope.from,
                kind = ?envelope.kind(),
                "Signal reached nobody"
            );
            if self.settings.report_delivery_failures {
                let notice = ServerMessage::DeliveryFailed {
                    room_id: self.room_id.clone(),
                    to: envelope.to,
                    kind: envelope.kind(),
                };
                self.deliver(&envelope.from, notice).await;
            }
        }
    }

    async fn notify(&mut self, from: ConnectionId, notice: Notice) {
        let Some(sender) = self.members.get(&from).cloned() else {
            let err = RegistryError::NotInRoom(self.room_id.clone());
            self.deliver(&from, error_message(&err)).await;
            return;
        };

        let message = notice.to_server_message(self.room_id.clone(), sender);
        self.broadcast_except(&from, message).await;
    }

    async fn broadcast_except(&self, from: &ConnectionId, message: ServerMessage) -> usize {
        let mut delivered = 0;
        for member in self.members_by_join() {
            if member.connection_id == *from {
                continue;
            }
            if self.deliver(&member.connection_id, message.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn deliver(&self, connection_id: &ConnectionId, message: ServerMessage) -> bool {
        self.signaling.deliver(connection_id, message).await
    }

    fn room_joined(&self, local: MemberInfo, members: Vec<MemberInfo>) -> ServerMessage {
        ServerMessage::RoomJoined {
            room_id: self.room_id.clone(),
            local,
            members,
        }
    }

    fn members_by_join(&self) -> Vec<MemberInfo> {
        let mut members: Vec<MemberInfo> = self.members.values().cloned().collect();
        members.sort_by_key(|m| m.join_seq);
        members
    }

    fn members_except(&self, connection_id: &ConnectionId) -> Vec<MemberInfo> {
        self.members_by_join()
            .into_iter()
            .filter(|m| m.connection_id != *connection_id)
            .collect()
    }
}

pub(crate) fn error_message(err: &RegistryError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code(),
        message: err.to_string(),
    }
}
