use super::{CallCommand, CallEvent, CallSession, CallSummary, SessionEvent};
use crate::config::SessionConfig;
use crate::media::{MediaDevices, MediaTrack};
use crate::peer::{PeerConnector, PeerEvent};
use crate::signal_sink::SignalSink;
use consult_core::ServerMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Runs a [`CallSession`] to completion.
///
/// Inbound signaling closing is treated as a disconnect; the command channel
/// closing means the hosting view went away.
pub struct CallDriver {
    session: CallSession,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
    commands: mpsc::UnboundedReceiver<CallCommand>,
    peer_events: mpsc::UnboundedReceiver<PeerEvent>,
}

impl CallDriver {
    pub fn new(
        config: SessionConfig,
        devices: Arc<dyn MediaDevices>,
        connector: Arc<dyn PeerConnector>,
        signals: Arc<dyn SignalSink>,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
        commands: mpsc::UnboundedReceiver<CallCommand>,
    ) -> (Self, mpsc::UnboundedReceiver<CallEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let session = CallSession::new(config, devices, connector, signals, events_tx, peer_tx);
        let driver = Self {
            session,
            inbound,
            commands,
            peer_events: peer_rx,
        };
        (driver, events_rx)
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub async fn run(mut self) -> CallSummary {
        info!(room_id = %self.session.room_id(), "Call driver started");

        if let Err(e) = self.session.start().await {
            error!(room_id = %self.session.room_id(), "Could not start call: {}", e);
            return self.session.summary();
        }

        while !self.session.state().is_ended() {
            let event = self.next_event().await;
            self.session.dispatch(event).await;
        }

        let summary = self.session.summary();
        info!(room_id = %self.session.room_id(), ?summary, "Call driver finished");
        summary
    }

    async fn next_event(&mut self) -> SessionEvent {
        let screen = self.session.screen_track().cloned();

        tokio::select! {
            msg = self.inbound.recv() => match msg {
                Some(msg) => SessionEvent::Server(msg),
                None => SessionEvent::TransportClosed,
            },

            cmd = self.commands.recv() => match cmd {
                Some(cmd) => SessionEvent::Command(cmd),
                None => SessionEvent::ViewClosed,
            },

            Some(evt) = self.peer_events.recv() => SessionEvent::Peer(evt),

            _ = track_ended(screen) => SessionEvent::ScreenTrackEnded,
        }
    }
}

async fn track_ended(track: Option<MediaTrack>) {
    match track {
        Some(track) => track.ended().await,
        None => std::future::pending().await,
    }
}
