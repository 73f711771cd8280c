use crate::error::SignalError;
use consult_core::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of the signaling channel.
pub trait SignalSink: Send + Sync {
    fn send(&self, message: ClientMessage) -> Result<(), SignalError>;
}

impl SignalSink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, message: ClientMessage) -> Result<(), SignalError> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| SignalError::Closed)
    }
}
