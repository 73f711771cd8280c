//! Client side of a one-to-one consult call.
//!
//! [`CallSession`] is the state machine: it acquires local media, takes the
//! initiator or responder role, drives negotiation through a [`PeerHandle`]
//! and releases everything exactly once when the call ends.
//! [`CallDriver`] feeds it from the signaling socket, the hosting UI and the
//! peer connection.

pub mod config;
pub mod error;
pub mod media;
pub mod peer;
pub mod rtc;
pub mod session;
pub mod signal_sink;
pub mod transport;

pub use config::SessionConfig;
pub use error::{CallError, MediaError, PeerError, SignalError};
pub use media::*;
pub use peer::*;
pub use session::*;
pub use signal_sink::SignalSink;
