use crate::error::PeerError;
use crate::media::{MediaKind, TrackSink};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

pub const STREAM_ID: &str = "consult";

/// A local track fed with already-encoded samples (Opus or VP8).
pub struct SampleTrack {
    kind: MediaKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl SampleTrack {
    pub fn new(kind: MediaKind, id: &str) -> Self {
        let mime_type = match kind {
            MediaKind::Microphone => MIME_TYPE_OPUS,
            MediaKind::Camera | MediaKind::Screen => MIME_TYPE_VP8,
        };

        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            id.to_owned(),
            STREAM_ID.to_owned(),
        ));

        Self {
            kind,
            track,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sends one encoded frame. Returns `false` when the frame was dropped
    /// because the track is muted or stopped.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<bool, PeerError> {
        if self.is_stopped() || !self.enabled.load(Ordering::Acquire) {
            return Ok(false);
        }

        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.track.write_sample(&sample).await?;
        Ok(true)
    }
}

impl TrackSink for SampleTrack {
    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn rtc_track(&self) -> Option<Arc<dyn TrackLocal + Send + Sync>> {
        Some(self.track.clone())
    }
}
