//! The peer-connection seam.
//!
//! A [`PeerConnector`] builds one [`PeerHandle`] per call. Everything the
//! connection reports back (candidates, state, remote tracks, failures)
//! arrives as a [`PeerEvent`] on the channel given to `connect`, and is
//! applied to the session through [`PeerEvents`].

use crate::error::PeerError;
use crate::media::{LocalStream, MediaKind, MediaTrack};
use async_trait::async_trait;
use consult_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub role: PeerRole,
    pub ice_servers: Vec<IceServerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: MediaKind,
}

#[derive(Debug)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    StateChanged(PeerConnectionState),
    RemoteTrack(RemoteTrack),
    Error(PeerError),
    Closed,
}

impl PeerEvent {
    pub async fn apply<E>(self, target: &mut E)
    where
        E: PeerEvents + ?Sized,
    {
        match self {
            PeerEvent::LocalCandidate(candidate) => target.on_local_candidate(candidate).await,
            PeerEvent::StateChanged(state) => target.on_state_change(state).await,
            PeerEvent::RemoteTrack(track) => target.on_remote_track(track).await,
            PeerEvent::Error(error) => target.on_error(error).await,
            PeerEvent::Closed => target.on_close().await,
        }
    }
}

/// Callback surface of a peer connection, implemented by the call session.
#[async_trait]
pub trait PeerEvents: Send {
    async fn on_local_candidate(&mut self, candidate: IceCandidate);

    async fn on_state_change(&mut self, state: PeerConnectionState);

    async fn on_remote_track(&mut self, track: RemoteTrack);

    async fn on_error(&mut self, error: PeerError);

    async fn on_close(&mut self);
}

/// One negotiated connection to the other participant.
#[async_trait]
pub trait PeerHandle: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String, PeerError>;

    /// Installs a remote offer and returns the local answer. A pending local
    /// offer is rolled back first.
    async fn accept_offer(&self, sdp: String) -> Result<String, PeerError>;

    async fn accept_answer(&self, sdp: String) -> Result<(), PeerError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    /// Swaps the outgoing video source without renegotiating.
    async fn replace_video_track(&self, track: Option<MediaTrack>) -> Result<(), PeerError>;

    async fn close(&self) -> Result<(), PeerError>;
}

#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        config: PeerConfig,
        local: &LocalStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn PeerHandle>, PeerError>;
}
