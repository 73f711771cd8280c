use crate::error::PeerError;
use crate::media::{LocalStream, MediaKind, MediaTrack};
use crate::peer::{
    PeerConfig, PeerConnectionState, PeerConnector, PeerEvent, PeerHandle, RemoteTrack,
};
use async_trait::async_trait;
use consult_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

/// Builds `webrtc` peer connections with the default codecs and
/// interceptors.
#[derive(Debug, Default, Clone)]
pub struct RtcConnector;

impl RtcConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PeerConnector for RtcConnector {
    async fn connect(
        &self,
        config: PeerConfig,
        local: &LocalStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn PeerHandle>, PeerError> {
        let peer = RtcPeer::new(config, local, events).await?;
        Ok(Arc::new(peer))
    }
}

pub struct RtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Option<Arc<RTCRtpSender>>,
}

impl RtcPeer {
    pub async fn new(
        config: PeerConfig,
        local: &LocalStream,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self, PeerError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        info!(role = ?config.role, "Peer connection created");

        let mut video_sender = None;
        for track in local.tracks() {
            let Some(rtc_track) = track.rtc_track() else {
                debug!(track_id = %track.id(), "Track has no RTP source, not sent");
                continue;
            };

            let sender = peer_connection.add_track(rtc_track).await?;
            if track.kind().is_video() {
                video_sender = Some(sender.clone());
            }
            drain_rtcp(sender);
        }

        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    debug!("Peer connection state changed: {:?}", s);
                    let _ = tx.send(PeerEvent::StateChanged(map_state(s)));
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(PeerEvent::LocalCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                }));
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Microphone,
                        _ => MediaKind::Camera,
                    };
                    let _ = tx.send(PeerEvent::RemoteTrack(RemoteTrack {
                        id: track.id(),
                        kind,
                    }));
                })
            },
        ));

        Ok(Self {
            peer_connection,
            video_sender,
        })
    }
}

#[async_trait]
impl PeerHandle for RtcPeer {
    async fn create_offer(&self) -> Result<String, PeerError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, PeerError> {
        if self.peer_connection.signaling_state() == RTCSignalingState::HaveLocalOffer {
            debug!("Rolling back local offer");
            // An empty rollback body is rejected, so echo the pending offer.
            let mut rollback = RTCSessionDescription::default();
            rollback.sdp_type = RTCSdpType::Rollback;
            if let Some(pending) = self.peer_connection.pending_local_description().await {
                rollback.sdp = pending.sdp;
            }
            self.peer_connection.set_local_description(rollback).await?;
        }

        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn accept_answer(&self, sdp: String) -> Result<(), PeerError> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn replace_video_track(&self, track: Option<MediaTrack>) -> Result<(), PeerError> {
        let Some(sender) = &self.video_sender else {
            return Err(PeerError::NoVideoSender);
        };
        sender
            .replace_track(track.and_then(|t| t.rtc_track()))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn map_state(state: RTCPeerConnectionState) -> PeerConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => PeerConnectionState::New,
    }
}

/// Incoming RTCP has to be read for interceptors to process it.
fn drain_rtcp(sender: Arc<RTCRtpSender>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 1500];
        while sender.read(&mut buf).await.is_ok() {}
    });
}
