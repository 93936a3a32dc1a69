use thiserror::Error;

/// Failures surfaced by negotiation and channel operations.
/// Every variant is caught at the user action that caused it and shown as a status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Pasted text or a received frame is not valid structured data
    #[error("could not read pasted text: {0}")]
    Parse(String),

    /// The WebRTC stack rejected an offer, answer or description
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    /// A send was attempted before the data channel opened or after it closed
    #[error("connection lost: data channel is not open")]
    ChannelNotOpen,

    /// The WebRTC stack reported a data channel fault
    #[error("data channel error: {0}")]
    Channel(String),

    /// The operation belongs to the other peer's side of the exchange
    #[error("{0}")]
    WrongRole(&'static str),

    /// The network thread is gone
    #[error("network runtime stopped: {0}")]
    Provider(String),
}

impl From<serde_json::Error> for ConnectionError {
    fn from(e: serde_json::Error) -> Self {
        ConnectionError::Parse(e.to_string())
    }
}
