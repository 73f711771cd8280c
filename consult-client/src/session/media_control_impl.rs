use super::{CallEvent, CallSession, CallState};
use crate::error::{CallError, MediaError};
use crate::media::MediaKind;
use consult_core::ClientMessage;
use tracing::{info, warn};

impl CallSession {
    /// Mutes or unmutes the camera in place. Only a presence notice goes
    /// out; the connection is not renegotiated.
    pub fn set_video_enabled(&mut self, enabled: bool) -> Result<(), CallError> {
        self.ensure_active("toggle video")?;
        let camera = self
            .local_stream
            .as_ref()
            .and_then(|stream| stream.video.clone())
            .ok_or(CallError::NoVideoTrack)?;

        camera.set_enabled(enabled);
        self.video_enabled = enabled;

        self.send_signal(ClientMessage::ToggleVideo {
            room_id: self.config.room_id.clone(),
            enabled,
        });
        self.emit(CallEvent::LocalVideoToggled(enabled));
        Ok(())
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) -> Result<(), CallError> {
        self.ensure_active("toggle audio")?;
        let microphone = self
            .local_stream
            .as_ref()
            .and_then(|stream| stream.audio.clone())
            .ok_or(MediaError::DeviceNotFound(MediaKind::Microphone))?;

        microphone.set_enabled(enabled);
        self.audio_enabled = enabled;

        self.send_signal(ClientMessage::ToggleAudio {
            room_id: self.config.room_id.clone(),
            enabled,
        });
        self.emit(CallEvent::LocalAudioToggled(enabled));
        Ok(())
    }

    /// Swaps the outgoing video for a screen capture on the existing
    /// connection.
    pub async fn start_screen_share(&mut self) -> Result<(), CallError> {
        if self.screen_sharing {
            return Ok(());
        }
        self.ensure_active("share your screen")?;
        let Some(peer) = self.peer.clone() else {
            return Err(CallError::InvalidState {
                action: "share your screen",
                state: self.state,
            });
        };

        let screen = self.devices.display_media().await?;
        if let Err(e) = peer.replace_video_track(Some(screen.clone())).await {
            screen.stop();
            return Err(e.into());
        }

        info!(room_id = %self.config.room_id, track_id = %screen.id(), "Screen share started");
        self.screen_track = Some(screen);
        self.screen_sharing = true;

        self.send_signal(ClientMessage::ScreenShareStarted {
            room_id: self.config.room_id.clone(),
        });
        self.emit(CallEvent::ScreenShareStarted);
        Ok(())
    }

    /// Puts the camera back on the outgoing sender and releases the screen.
    pub async fn stop_screen_share(&mut self) -> Result<(), CallError> {
        let Some(screen) = self.screen_track.take() else {
            self.screen_sharing = false;
            return Ok(());
        };
        self.screen_sharing = false;

        let camera = self
            .local_stream
            .as_ref()
            .and_then(|stream| stream.video.clone());
        let result = match self.peer.clone() {
            Some(peer) => peer
                .replace_video_track(camera)
                .await
                .map_err(CallError::from),
            None => Ok(()),
        };
        screen.stop();

        info!(room_id = %self.config.room_id, "Screen share stopped");
        self.send_signal(ClientMessage::ScreenShareStopped {
            room_id: self.config.room_id.clone(),
        });
        self.emit(CallEvent::ScreenShareStopped);
        result
    }

    /// The capture source went away on its own (e.g. revoked by the OS).
    pub(super) async fn on_screen_track_ended(&mut self) {
        let ended = self
            .screen_track
            .as_ref()
            .is_some_and(|track| track.is_ended());
        if !ended {
            return;
        }

        info!(room_id = %self.config.room_id, "Screen capture ended, reverting to camera");
        if let Err(e) = self.stop_screen_share().await {
            warn!(room_id = %self.config.room_id, "Could not restore camera: {}", e);
            self.emit(CallEvent::Status(e.status_message()));
        }
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), CallError> {
        match self.state {
            CallState::WaitingForPeer | CallState::Negotiating | CallState::Connected => Ok(()),
            state => Err(CallError::InvalidState { action, state }),
        }
    }
}
