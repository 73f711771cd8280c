//! Local capture handles.
//!
//! A [`MediaTrack`] is shared between whoever renders it and the peer
//! connection that sends it. Clones point at the same device; the device is
//! released the first time any clone calls [`MediaTrack::stop`].

use crate::error::MediaError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Microphone,
    Camera,
    Screen,
}

impl MediaKind {
    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Camera | MediaKind::Screen)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Microphone => "microphone",
            MediaKind::Camera => "camera",
            MediaKind::Screen => "screen",
        };
        f.write_str(name)
    }
}

/// The device-side half of a track.
pub trait TrackSink: Send + Sync {
    /// Called once, when the track is stopped.
    fn stop(&self);

    fn set_enabled(&self, _enabled: bool) {}

    /// Track to attach to a `webrtc` peer connection, if this sink has one.
    fn rtc_track(&self) -> Option<Arc<dyn TrackLocal + Send + Sync>> {
        None
    }
}

struct TrackInner {
    id: String,
    kind: MediaKind,
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
    sink: Arc<dyn TrackSink>,
}

#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: MediaKind, sink: Arc<dyn TrackSink>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), kind, sink)
    }

    pub fn with_id(id: impl Into<String>, kind: MediaKind, sink: Arc<dyn TrackSink>) -> Self {
        let (ended, _) = watch::channel(false);
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                kind,
                enabled: AtomicBool::new(true),
                ended,
                sink,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Mutes or unmutes in place. The track keeps flowing to the peer.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
        self.inner.sink.set_enabled(enabled);
    }

    pub fn is_ended(&self) -> bool {
        *self.inner.ended.borrow()
    }

    /// Releases the device. Also the path for a source ending on its own
    /// (e.g. the OS revoking screen capture). Only the first call reaches
    /// the sink.
    pub fn stop(&self) {
        if self.inner.ended.send_replace(true) {
            return;
        }
        debug!(track_id = %self.inner.id, kind = %self.inner.kind, "Stopping track");
        self.inner.sink.stop();
    }

    /// Resolves once the track has ended.
    pub async fn ended(&self) {
        let mut ended = self.inner.ended.subscribe();
        let _ = ended.wait_for(|ended| *ended).await;
    }

    pub fn rtc_track(&self) -> Option<Arc<dyn TrackLocal + Send + Sync>> {
        self.inner.sink.rtc_track()
    }

    /// Whether both handles refer to the same captured source.
    pub fn same_track(&self, other: &MediaTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Camera and microphone captured for one call.
#[derive(Debug, Clone, Default)]
pub struct LocalStream {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

impl LocalStream {
    pub fn is_audio_only(&self) -> bool {
        self.video.is_none()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn stop(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const AUDIO_VIDEO: Self = Self {
        audio: true,
        video: true,
    };

    pub const AUDIO_ONLY: Self = Self {
        audio: true,
        video: false,
    };
}

/// Access to capture devices (`getUserMedia` / `getDisplayMedia`).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn user_media(&self, constraints: MediaConstraints) -> Result<LocalStream, MediaError>;

    async fn display_media(&self) -> Result<MediaTrack, MediaError>;
}
