// Scripted NegotiationProvider for tests
// Records every call and replays queued events in order

use std::collections::VecDeque;

use super::description::{SdpType, SessionDescription};
use super::error::ConnectionError;
use super::provider::{ChannelOptions, NegotiationProvider, ProviderEvent};

#[derive(Debug, Default)]
pub struct FakeProvider {
    pub initialized: usize,
    pub stun_servers: Vec<String>,
    pub channels_created: Vec<ChannelOptions>,
    pub channels_recreated: usize,
    pub local: Option<SessionDescription>,
    pub remote: Option<SessionDescription>,
    pub sent: Vec<String>,
    pub events: VecDeque<ProviderEvent>,
    /// Make set_remote_description fail like a stack rejecting the SDP
    pub reject_remote: bool,
    pub closed: bool,
}

impl FakeProvider {
    pub fn offer_description() -> SessionDescription {
        SessionDescription::offer(
            "v=0\r\na=candidate:1 1 udp 2130706431 10.0.0.1 50000 typ host\r\n",
        )
    }

    pub fn answer_description() -> SessionDescription {
        SessionDescription::answer(
            "v=0\r\na=candidate:1 1 udp 2130706431 10.0.0.2 50001 typ host\r\n",
        )
    }

    pub fn push(&mut self, event: ProviderEvent) {
        self.events.push_back(event);
    }
}

impl NegotiationProvider for FakeProvider {
    fn initialize(&mut self, stun_servers: &[String]) -> Result<(), ConnectionError> {
        self.initialized += 1;
        self.stun_servers = stun_servers.to_vec();
        Ok(())
    }

    fn create_data_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError> {
        self.channels_created.push(options.clone());
        Ok(())
    }

    fn recreate_data_channel(&mut self, _options: &ChannelOptions) -> Result<(), ConnectionError> {
        self.channels_recreated += 1;
        Ok(())
    }

    fn create_offer(&mut self) -> Result<SessionDescription, ConnectionError> {
        Ok(Self::offer_description())
    }

    fn create_answer(&mut self) -> Result<SessionDescription, ConnectionError> {
        match &self.remote {
            Some(remote) if remote.sdp_type == SdpType::Offer => Ok(Self::answer_description()),
            _ => Err(ConnectionError::Negotiation("no remote offer".to_string())),
        }
    }

    fn set_local_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError> {
        self.local = Some(description.clone());
        Ok(())
    }

    fn set_remote_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError> {
        if self.reject_remote {
            return Err(ConnectionError::Negotiation("malformed SDP".to_string()));
        }
        self.remote = Some(description.clone());
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.local.clone()
    }

    fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.sent.push(text.to_string());
        Ok(())
    }

    fn poll_event(&mut self) -> Option<ProviderEvent> {
        self.events.pop_front()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
