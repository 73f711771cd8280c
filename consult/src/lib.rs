pub use consult_core::model::{ConnectionId, RoomId, UserId};

pub mod model {
    pub use consult_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use consult_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use consult_client::*;
}
