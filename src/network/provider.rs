// Negotiation capability
// Everything the connection manager needs from a WebRTC stack, so the state machines
// above it can run against the str0m runtime or a scripted fake

use std::fmt;

use super::description::SessionDescription;
use super::error::ConnectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for PeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PeerConnectionState::New => "new",
            PeerConnectionState::Connecting => "connecting",
            PeerConnectionState::Connected => "connected",
            PeerConnectionState::Disconnected => "disconnected",
            PeerConnectionState::Failed => "failed",
            PeerConnectionState::Closed => "closed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for DataChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DataChannelState::Connecting => "connecting",
            DataChannelState::Open => "open",
            DataChannelState::Closing => "closing",
            DataChannelState::Closed => "closed",
        };
        f.write_str(text)
    }
}

/// Data channel parameters requested by the initiator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOptions {
    pub label: String,
    pub ordered: bool,
}

impl ChannelOptions {
    /// Ordered and reliable: the game protocol has no sequence numbers of its own
    pub fn ordered(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ordered: true,
        }
    }
}

/// Notifications from the WebRTC stack, delivered one at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    PeerStateChanged(PeerConnectionState),
    /// A local ICE candidate was added to the pending description
    CandidateGathered(String),
    GatheringComplete,
    /// The responder learned about the initiator's channel
    RemoteChannel { label: String },
    ChannelStateChanged(DataChannelState),
    ChannelMessage(String),
    ChannelError(String),
}

pub trait NegotiationProvider {
    /// Set up the peer connection with the given STUN servers
    fn initialize(&mut self, stun_servers: &[String]) -> Result<(), ConnectionError>;

    fn create_data_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError>;

    /// Close the current data channel and open a new one on the established connection
    fn recreate_data_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError>;

    fn create_offer(&mut self) -> Result<SessionDescription, ConnectionError>;

    fn create_answer(&mut self) -> Result<SessionDescription, ConnectionError>;

    fn set_local_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError>;

    fn set_remote_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError>;

    /// The committed local description including any candidates gathered so far
    fn local_description(&self) -> Option<SessionDescription>;

    fn send(&mut self, text: &str) -> Result<(), ConnectionError>;

    fn poll_event(&mut self) -> Option<ProviderEvent>;

    fn close(&mut self);
}
