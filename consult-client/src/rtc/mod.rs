//! Native peer and media adapters built on the `webrtc` crate.

mod rtc_connector;
mod sample_devices;
mod sample_track;

pub use rtc_connector::{RtcConnector, RtcPeer};
pub use sample_devices::{Availability, SampleDevices};
pub use sample_track::SampleTrack;
