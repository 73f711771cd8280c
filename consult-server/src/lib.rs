//! Room registry and signaling relay for one-to-one consult calls.
//!
//! The server never touches media. It tracks who is in which room, relays
//! offers, answers and ICE candidates between the two members, and tells
//! each side when the other arrives or leaves.

pub mod config;
pub mod errors;
pub mod identity;
pub mod room;
pub mod signaling;

mod app;

pub use app::{AppState, router};
pub use config::ServerConfig;
pub use errors::RegistryError;
pub use identity::{HeaderIdentity, IdentityError, IdentityProvider};
pub use room::*;
pub use signaling::*;
