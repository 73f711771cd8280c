use super::fake_media::FakeDevices;
use super::fake_peer::FakeConnector;
use super::signals::*;
use consult_client::{CallEvent, CallSession, PeerEvent, SessionConfig, SessionEvent};
use consult_core::{ClientMessage, MemberInfo, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A session driven by hand, one event at a time.
pub struct Harness {
    pub me: MemberInfo,
    pub session: CallSession,
    pub devices: Arc<FakeDevices>,
    pub connector: Arc<FakeConnector>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::UnboundedReceiver<CallEvent>,
    peer_events: mpsc::UnboundedReceiver<PeerEvent>,
}

impl Harness {
    pub fn new(me: MemberInfo, devices: FakeDevices, connector: FakeConnector) -> Self {
        Self::with_config(me, devices, connector, SessionConfig::new(room_id()))
    }

    pub fn with_config(
        me: MemberInfo,
        devices: FakeDevices,
        connector: FakeConnector,
        config: SessionConfig,
    ) -> Self {
        let (signal_tx, outbound) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (peer_tx, peer_events) = mpsc::unbounded_channel();
        let devices = Arc::new(devices);
        let connector = Arc::new(connector);

        let session = CallSession::new(
            config,
            devices.clone(),
            connector.clone(),
            Arc::new(signal_tx),
            events_tx,
            peer_tx,
        );

        Self {
            me,
            session,
            devices,
            connector,
            outbound,
            events,
            peer_events,
        }
    }

    /// Started, greeted and in the room with `present` already there.
    pub async fn joined(user: &str, join_seq: u64, present: &[MemberInfo]) -> Self {
        let mut harness = Self::new(
            member(user, join_seq),
            FakeDevices::new(),
            FakeConnector::new(user),
        );
        harness.session.start().await.expect("session starts");
        let me = harness.me.clone();
        harness.deliver(welcome(&me)).await;
        harness.deliver(room_joined(&me, present)).await;
        harness
    }

    pub async fn deliver(&mut self, msg: ServerMessage) {
        self.session.dispatch(SessionEvent::Server(msg)).await;
    }

    /// Applies every peer callback queued so far.
    pub async fn pump(&mut self) {
        while let Ok(evt) = self.peer_events.try_recv() {
            self.session.dispatch(SessionEvent::Peer(evt)).await;
        }
    }

    pub fn sent(&mut self) -> Vec<ClientMessage> {
        let mut sent = Vec::new();
        while let Ok(msg) = self.outbound.try_recv() {
            sent.push(msg);
        }
        sent
    }

    pub fn events(&mut self) -> Vec<CallEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.events.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Shuttles frames between two hand-driven sessions, as the relay would,
/// until neither has anything left to say. Returns what each side sent.
pub async fn exchange(a: &mut Harness, b: &mut Harness) -> (Vec<ClientMessage>, Vec<ClientMessage>) {
    let mut sent_by_a = Vec::new();
    let mut sent_by_b = Vec::new();

    loop {
        a.pump().await;
        b.pump().await;

        let from_a = a.sent();
        let from_b = b.sent();
        if from_a.is_empty() && from_b.is_empty() {
            break;
        }

        for msg in &from_a {
            if let Some(relayed) = relayed(&a.me, msg.clone()) {
                b.deliver(relayed).await;
            }
        }
        for msg in &from_b {
            if let Some(relayed) = relayed(&b.me, msg.clone()) {
                a.deliver(relayed).await;
            }
        }

        sent_by_a.extend(from_a);
        sent_by_b.extend(from_b);
    }

    (sent_by_a, sent_by_b)
}
