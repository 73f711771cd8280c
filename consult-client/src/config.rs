use consult_core::utils::default_stun_urls;
use consult_core::{IceServerConfig, RoomId};

/// Per-call settings handed over by the scheduling collaborator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room_id: RoomId,

    /// Appointment-side participant id, forwarded in `join-room`.
    pub participant_id: Option<String>,

    /// Used until the server's `welcome` provides its own list.
    pub ice_servers: Vec<IceServerConfig>,

    /// Retry with microphone only when camera + microphone fails.
    pub audio_only_fallback: bool,
}

impl SessionConfig {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            participant_id: None,
            ice_servers: vec![IceServerConfig {
                urls: default_stun_urls(),
                username: None,
                credential: None,
            }],
            audio_only_fallback: true,
        }
    }

    pub fn with_participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }
}
