use crate::error::MediaError;
use crate::media::{LocalStream, MediaConstraints, MediaDevices, MediaKind, MediaTrack};
use crate::rtc::sample_track::SampleTrack;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Available,
    Missing,
    Denied,
}

/// [`MediaDevices`] backed by [`SampleTrack`]s.
///
/// The host looks tracks up by id with [`SampleDevices::sample_track`] and
/// pushes encoded frames into them.
#[derive(Default)]
pub struct SampleDevices {
    availability: HashMap<MediaKind, Availability>,
    tracks: Mutex<HashMap<String, Arc<SampleTrack>>>,
}

impl SampleDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_availability(mut self, kind: MediaKind, availability: Availability) -> Self {
        self.availability.insert(kind, availability);
        self
    }

    pub async fn sample_track(&self, track_id: &str) -> Option<Arc<SampleTrack>> {
        self.tracks.lock().await.get(track_id).cloned()
    }

    async fn capture(&self, kind: MediaKind) -> Result<MediaTrack, MediaError> {
        match self.availability.get(&kind).copied().unwrap_or_default() {
            Availability::Available => {}
            Availability::Missing => return Err(MediaError::DeviceNotFound(kind)),
            Availability::Denied => {
                warn!(%kind, "Capture permission denied");
                return Err(MediaError::PermissionDenied(kind));
            }
        }

        let id = Uuid::new_v4().to_string();
        let sample = Arc::new(SampleTrack::new(kind, &id));
        self.tracks.lock().await.insert(id.clone(), sample.clone());

        debug!(%kind, track_id = %id, "Capture started");
        Ok(MediaTrack::with_id(id, kind, sample))
    }
}

#[async_trait]
impl MediaDevices for SampleDevices {
    /// Like `getUserMedia`: if any requested device fails, the whole request
    /// fails.
    async fn user_media(&self, constraints: MediaConstraints) -> Result<LocalStream, MediaError> {
        let audio = if constraints.audio {
            Some(self.capture(MediaKind::Microphone).await?)
        } else {
            None
        };

        let video = if constraints.video {
            match self.capture(MediaKind::Camera).await {
                Ok(track) => Some(track),
                Err(e) => {
                    if let Some(audio) = &audio {
                        audio.stop();
                    }
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(LocalStream { audio, video })
    }

    async fn display_media(&self) -> Result<MediaTrack, MediaError> {
        self.capture(MediaKind::Screen).await
    }
}
