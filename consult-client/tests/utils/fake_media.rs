use async_trait::async_trait;
use consult_client::rtc::Availability;
use consult_client::{
    LocalStream, MediaConstraints, MediaDevices, MediaError, MediaKind, MediaTrack, TrackSink,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Device stand-in that counts how often it is released.
pub struct CountingSink {
    pub stops: AtomicUsize,
    pub enabled: AtomicBool,
}

impl Default for CountingSink {
    fn default() -> Self {
        Self {
            stops: AtomicUsize::new(0),
            enabled: AtomicBool::new(true),
        }
    }
}

impl CountingSink {
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl TrackSink for CountingSink {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeDevices {
    availability: HashMap<MediaKind, Availability>,
    pub requests: Mutex<Vec<MediaConstraints>>,
    pub captured: Mutex<Vec<(MediaTrack, Arc<CountingSink>)>>,
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: MediaKind, availability: Availability) -> Self {
        self.availability.insert(kind, availability);
        self
    }

    /// Every sink captured for a kind, oldest first.
    pub fn sinks(&self, kind: MediaKind) -> Vec<Arc<CountingSink>> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .filter(|(track, _)| track.kind() == kind)
            .map(|(_, sink)| sink.clone())
            .collect()
    }

    pub fn last_track(&self, kind: MediaKind) -> Option<MediaTrack> {
        self.captured
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(track, _)| track.kind() == kind)
            .map(|(track, _)| track.clone())
    }

    fn capture(&self, kind: MediaKind) -> Result<MediaTrack, MediaError> {
        match self.availability.get(&kind).copied().unwrap_or_default() {
            Availability::Available => {}
            Availability::Missing => return Err(MediaError::DeviceNotFound(kind)),
            Availability::Denied => return Err(MediaError::PermissionDenied(kind)),
        }

        let sink = Arc::new(CountingSink::default());
        let track = MediaTrack::new(kind, sink.clone());
        self.captured.lock().unwrap().push((track.clone(), sink));
        Ok(track)
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn user_media(&self, constraints: MediaConstraints) -> Result<LocalStream, MediaError> {
        self.requests.lock().unwrap().push(constraints);

        let audio = if constraints.audio {
            Some(self.capture(MediaKind::Microphone)?)
        } else {
            None
        };
        let video = if constraints.video {
            match self.capture(MediaKind::Camera) {
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
        self.capture(MediaKind::Screen)
    }
}
