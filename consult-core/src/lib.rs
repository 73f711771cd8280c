//! Message contracts shared by the consult signaling server and call clients.

pub mod model;
pub mod utils;

pub use model::*;
