// Connection manager
// Owns the peer connection and its single data channel, turns provider notifications
// into a small state the UI can show, and runs the manual offer/answer exchange

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::description::{SdpType, SessionDescription};
use super::error::ConnectionError;
use super::provider::{
    ChannelOptions, DataChannelState, NegotiationProvider, PeerConnectionState, ProviderEvent,
};

/// Which half of the exchange this peer plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the offer and the data channel; moves first
    Initiator,
    /// Accepted the offer; receives the channel from the initiator
    Responder,
}

/// Channel notifications handed to the application, identical for both channel creation paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

pub struct ConnectionManager<P> {
    provider: P,
    stun_servers: Vec<String>,
    channel_options: ChannelOptions,
    gathering_delay: Duration,

    initialized: bool,
    closed: bool,
    role: Option<Role>,
    peer_state: PeerConnectionState,
    channel_state: Option<DataChannelState>,

    /// Set while waiting for candidates after committing a local description
    gathering_since: Option<Instant>,
    gathering_done: bool,
    local_description: Option<SessionDescription>,
    answer_applied: bool,

    error: Option<String>,
}

impl<P: NegotiationProvider> ConnectionManager<P> {
    pub fn new(
        provider: P,
        stun_servers: Vec<String>,
        channel_options: ChannelOptions,
        gathering_delay: Duration,
    ) -> Self {
        Self {
            provider,
            stun_servers,
            channel_options,
            gathering_delay,
            initialized: false,
            closed: false,
            role: None,
            peer_state: PeerConnectionState::New,
            channel_state: None,
            gathering_since: None,
            gathering_done: false,
            local_description: None,
            answer_applied: false,
            error: None,
        }
    }

    pub fn initialize(&mut self) -> Result<(), ConnectionError> {
        if self.initialized {
            return Ok(());
        }
        if self.closed {
            return Err(ConnectionError::Provider("connection was closed".to_string()));
        }
        self.provider.initialize(&self.stun_servers)?;
        self.initialized = true;
        info!(stun_servers = ?self.stun_servers, "peer connection initialized");
        Ok(())
    }

    /// Initiator step 1: open the channel, create and commit an offer
    pub fn create_offer(&mut self, now: Instant) -> Result<(), ConnectionError> {
        self.ensure_unassigned()?;
        self.initialize()?;

        self.provider.create_data_channel(&self.channel_options)?;
        let offer = self.provider.create_offer()?;
        self.provider.set_local_description(&offer)?;

        self.role = Some(Role::Initiator);
        self.channel_state = Some(DataChannelState::Connecting);
        self.begin_gathering(now);
        info!(label = %self.channel_options.label, "offer created, gathering candidates");
        Ok(())
    }

    /// Responder step: apply the pasted offer, create and commit an answer
    pub fn accept_offer(&mut self, text: &str, now: Instant) -> Result<(), ConnectionError> {
        self.ensure_unassigned()?;
        let offer = SessionDescription::parse_expecting(text, SdpType::Offer)?;
        self.initialize()?;

        self.provider.set_remote_description(&offer)?;
        let answer = self.provider.create_answer()?;
        self.provider.set_local_description(&answer)?;

        self.role = Some(Role::Responder);
        self.begin_gathering(now);
        info!(
            remote_candidates = offer.candidate_count(),
            "offer accepted, gathering candidates for answer"
        );
        Ok(())
    }

    /// Initiator step 2: apply the pasted answer
    pub fn apply_answer(&mut self, text: &str) -> Result<(), ConnectionError> {
        if self.role != Some(Role::Initiator) {
            return Err(ConnectionError::WrongRole(
                "only the player who created the offer can set an answer",
            ));
        }
        let answer = SessionDescription::parse_expecting(text, SdpType::Answer)?;
        self.provider.set_remote_description(&answer)?;
        self.answer_applied = true;
        info!(remote_candidates = answer.candidate_count(), "answer applied");
        Ok(())
    }

    /// Finish the gathering wait once candidates are in or the fixed delay ran out.
    /// Returns the description to hand to the other player, exactly once.
    pub fn tick(&mut self, now: Instant) -> Option<SessionDescription> {
        let since = self.gathering_since?;
        let timed_out = now.saturating_duration_since(since) >= self.gathering_delay;
        if !self.gathering_done && !timed_out {
            return None;
        }

        self.gathering_since = None;
        if timed_out && !self.gathering_done {
            debug!("gathering delay elapsed before gathering completed");
        }

        match self.provider.local_description() {
            Some(description) => {
                info!(
                    kind = description.sdp_type.label(),
                    candidates = description.candidate_count(),
                    "local description ready"
                );
                self.local_description = Some(description.clone());
                Some(description)
            }
            None => {
                self.error = Some(
                    ConnectionError::Negotiation("no local description available".to_string())
                        .to_string(),
                );
                None
            }
        }
    }

    /// Single dispatch point for provider notifications
    pub fn handle_event(&mut self, event: ProviderEvent) -> Option<ChannelEvent> {
        if self.closed {
            return None;
        }

        match event {
            ProviderEvent::PeerStateChanged(state) => {
                info!(from = %self.peer_state, to = %state, "peer connection state changed");
                self.peer_state = state;
                None
            }
            ProviderEvent::CandidateGathered(candidate) => {
                debug!(%candidate, "local candidate gathered");
                None
            }
            ProviderEvent::GatheringComplete => {
                self.gathering_done = true;
                None
            }
            ProviderEvent::RemoteChannel { label } => {
                // Same handling as a locally created channel from here on
                info!(%label, "remote data channel announced");
                if self.channel_state.is_none() {
                    self.channel_state = Some(DataChannelState::Connecting);
                }
                None
            }
            ProviderEvent::ChannelStateChanged(state) => self.on_channel_state(state),
            ProviderEvent::ChannelMessage(text) => {
                debug!(bytes = text.len(), "channel message received");
                Some(ChannelEvent::Message(text))
            }
            ProviderEvent::ChannelError(message) => {
                warn!(%message, "data channel error");
                self.error = Some(ConnectionError::Channel(message.clone()).to_string());
                Some(ChannelEvent::Error(message))
            }
        }
    }

    fn on_channel_state(&mut self, state: DataChannelState) -> Option<ChannelEvent> {
        let previous = self.channel_state.replace(state);
        info!(?previous, to = %state, "data channel state changed");
        match state {
            DataChannelState::Open => {
                self.error = None;
                Some(ChannelEvent::Opened)
            }
            DataChannelState::Closed if previous != Some(DataChannelState::Closed) => {
                Some(ChannelEvent::Closed)
            }
            _ => None,
        }
    }

    /// Drain every queued provider event through `handle_event`
    pub fn pump_events(&mut self) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        while !self.closed {
            let Some(event) = self.provider.poll_event() else {
                break;
            };
            if let Some(channel_event) = self.handle_event(event) {
                events.push(channel_event);
            }
        }
        events
    }

    /// Reopen a stuck data channel. Only the channel's creator can do this.
    pub fn retry(&mut self) -> Result<(), ConnectionError> {
        match self.role {
            Some(Role::Initiator) => {
                self.provider.recreate_data_channel(&self.channel_options)?;
                self.channel_state = Some(DataChannelState::Connecting);
                info!("data channel recreated");
                Ok(())
            }
            Some(Role::Responder) => Err(ConnectionError::WrongRole(
                "only the other player can reopen the channel: ask them to retry",
            )),
            None => Err(ConnectionError::WrongRole("nothing to retry yet")),
        }
    }

    pub fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        if self.channel_state != Some(DataChannelState::Open) {
            return Err(ConnectionError::ChannelNotOpen);
        }
        self.provider.send(text)
    }

    /// Teardown: stops event dispatch and releases the provider
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.provider.close();
        self.closed = true;
        self.peer_state = PeerConnectionState::Closed;
        if self.channel_state.is_some() {
            self.channel_state = Some(DataChannelState::Closed);
        }
        info!("connection closed");
    }

    fn ensure_unassigned(&self) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::Provider("connection was closed".to_string()));
        }
        if self.role.is_some() {
            return Err(ConnectionError::WrongRole(
                "negotiation already started: restart to begin again",
            ));
        }
        Ok(())
    }

    fn begin_gathering(&mut self, now: Instant) {
        self.gathering_since = Some(now);
        self.gathering_done = false;
        self.error = None;
    }

    pub fn is_channel_open(&self) -> bool {
        self.channel_state == Some(DataChannelState::Open)
    }

    pub fn is_gathering(&self) -> bool {
        self.gathering_since.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Human readable connection status derived from the current state
    pub fn status(&self) -> String {
        use DataChannelState as Dc;
        use PeerConnectionState as Pc;

        match (self.peer_state, self.channel_state) {
            (Pc::Closed, _) => "Connection closed".to_string(),
            (Pc::Failed, _) => "Connection failed: restart to try again".to_string(),
            (Pc::Disconnected, _) => "Peer disconnected".to_string(),
            (_, Some(Dc::Open)) => "Connected: data channel open".to_string(),
            (_, Some(Dc::Closing)) => "Data channel closing".to_string(),
            (_, Some(Dc::Closed)) => match self.role {
                Some(Role::Initiator) => "Data channel closed: press R to reopen".to_string(),
                _ => "Data channel closed: ask the other player to retry".to_string(),
            },
            (Pc::Connected, _) => "Peer connected, waiting for data channel...".to_string(),
            (Pc::Connecting, _) => "Connecting to peer...".to_string(),
            (Pc::New, _) => self.negotiation_status(),
        }
    }

    fn negotiation_status(&self) -> String {
        if self.is_gathering() {
            return "Gathering candidates...".to_string();
        }
        match (self.role, self.answer_applied) {
            (None, _) => "Not connected: create an offer or accept one".to_string(),
            (Some(Role::Initiator), false) => {
                "Offer ready: send it to the other player, then set their answer".to_string()
            }
            (Some(Role::Initiator), true) => "Answer set, connecting...".to_string(),
            (Some(Role::Responder), _) => {
                "Answer ready: send it back to the other player".to_string()
            }
        }
    }
}

/// Inspection used by tests to drive and observe a manager
#[cfg(test)]
impl<P: NegotiationProvider> ConnectionManager<P> {
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn peer_state(&self) -> PeerConnectionState {
        self.peer_state
    }

    pub fn channel_state(&self) -> Option<DataChannelState> {
        self.channel_state
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeProvider;

    const DELAY: Duration = Duration::from_millis(500);

    fn manager() -> ConnectionManager<FakeProvider> {
        ConnectionManager::new(
            FakeProvider::default(),
            vec!["stun.example.org:3478".to_string()],
            ChannelOptions::ordered("test"),
            DELAY,
        )
    }

    fn offer_text() -> String {
        FakeProvider::offer_description().to_labelled_text().unwrap()
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut m = manager();
        m.initialize().unwrap();
        m.initialize().unwrap();
        assert_eq!(m.provider().initialized, 1);
        assert_eq!(m.provider().stun_servers, vec!["stun.example.org:3478".to_string()]);
    }

    #[test]
    fn test_create_offer_opens_ordered_channel() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();

        assert_eq!(m.role(), Some(Role::Initiator));
        assert_eq!(m.channel_state(), Some(DataChannelState::Connecting));
        assert_eq!(m.provider().channels_created, vec![ChannelOptions::ordered("test")]);
        assert!(m.provider().channels_created[0].ordered);
        assert_eq!(
            m.provider().local.as_ref().map(|d| d.sdp_type),
            Some(SdpType::Offer)
        );
    }

    #[test]
    fn test_description_emitted_after_fixed_delay() {
        let mut m = manager();
        let start = Instant::now();
        m.create_offer(start).unwrap();

        assert_eq!(m.tick(start + Duration::from_millis(100)), None);
        assert_eq!(m.status(), "Gathering candidates...");

        let offer = m.tick(start + DELAY).unwrap();
        assert_eq!(offer.sdp_type, SdpType::Offer);
        assert!(m.local_description().is_some());

        // Emitted once only
        assert_eq!(m.tick(start + DELAY * 2), None);
    }

    #[test]
    fn test_gathering_complete_ends_wait_early() {
        let mut m = manager();
        let start = Instant::now();
        m.create_offer(start).unwrap();
        m.provider_mut().push(ProviderEvent::GatheringComplete);
        m.pump_events();

        assert!(m.tick(start + Duration::from_millis(1)).is_some());
    }

    #[test]
    fn test_accept_offer_with_label() {
        let mut m = manager();
        m.accept_offer(&offer_text(), Instant::now()).unwrap();

        assert_eq!(m.role(), Some(Role::Responder));
        assert_eq!(m.provider().remote, Some(FakeProvider::offer_description()));
        assert_eq!(
            m.provider().local.as_ref().map(|d| d.sdp_type),
            Some(SdpType::Answer)
        );
        // Responder never creates a channel
        assert!(m.provider().channels_created.is_empty());
    }

    #[test]
    fn test_accept_offer_parse_error_leaves_state_untouched() {
        let mut m = manager();
        let err = m.accept_offer("Offer: {broken", Instant::now()).unwrap_err();
        assert!(matches!(err, ConnectionError::Parse(_)));
        assert_eq!(m.role(), None);

        // Still free to try again with good text
        m.accept_offer(&offer_text(), Instant::now()).unwrap();
    }

    #[test]
    fn test_accept_offer_rejected_by_stack() {
        let mut m = manager();
        m.provider_mut().reject_remote = true;
        let err = m.accept_offer(&offer_text(), Instant::now()).unwrap_err();
        assert!(matches!(err, ConnectionError::Negotiation(_)));
        assert_eq!(m.role(), None);
        assert_eq!(m.provider().initialized, 1);
    }

    #[test]
    fn test_accept_answer_text_as_offer_is_parse_error() {
        let mut m = manager();
        let answer = FakeProvider::answer_description().to_text().unwrap();
        assert!(matches!(
            m.accept_offer(&answer, Instant::now()),
            Err(ConnectionError::Parse(_))
        ));
    }

    #[test]
    fn test_apply_answer_only_for_initiator() {
        let mut m = manager();
        let answer = FakeProvider::answer_description().to_labelled_text().unwrap();
        assert!(matches!(m.apply_answer(&answer), Err(ConnectionError::WrongRole(_))));

        m.create_offer(Instant::now()).unwrap();
        m.apply_answer(&answer).unwrap();
        assert_eq!(m.provider().remote, Some(FakeProvider::answer_description()));
    }

    #[test]
    fn test_answer_can_be_applied_while_still_gathering() {
        let mut m = manager();
        let start = Instant::now();
        m.create_offer(start).unwrap();
        let answer = FakeProvider::answer_description().to_text().unwrap();
        m.apply_answer(&answer).unwrap();
        assert!(m.is_gathering());
    }

    #[test]
    fn test_second_offer_is_refused() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        assert!(matches!(
            m.create_offer(Instant::now()),
            Err(ConnectionError::WrongRole(_))
        ));
        assert!(matches!(
            m.accept_offer(&offer_text(), Instant::now()),
            Err(ConnectionError::WrongRole(_))
        ));
    }

    #[test]
    fn test_both_channel_paths_converge() {
        let mut initiator = manager();
        initiator.create_offer(Instant::now()).unwrap();
        initiator
            .provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Open));

        let mut responder = manager();
        responder.accept_offer(&offer_text(), Instant::now()).unwrap();
        responder.provider_mut().push(ProviderEvent::RemoteChannel {
            label: "test".to_string(),
        });
        responder
            .provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Open));

        assert_eq!(initiator.pump_events(), vec![ChannelEvent::Opened]);
        assert_eq!(responder.pump_events(), vec![ChannelEvent::Opened]);
        assert!(initiator.is_channel_open());
        assert!(responder.is_channel_open());
        assert_eq!(initiator.status(), responder.status());
    }

    #[test]
    fn test_send_requires_open_channel() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        assert_eq!(m.send("hello"), Err(ConnectionError::ChannelNotOpen));
        assert!(m.provider().sent.is_empty());

        m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        m.send("hello").unwrap();
        assert_eq!(m.provider().sent, vec!["hello".to_string()]);

        m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Closed));
        assert_eq!(m.send("again"), Err(ConnectionError::ChannelNotOpen));
    }

    #[test]
    fn test_close_reported_once() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        assert_eq!(
            m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Closed)),
            Some(ChannelEvent::Closed)
        );
        assert_eq!(
            m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Closed)),
            None
        );
        assert_eq!(m.status(), "Data channel closed: press R to reopen");
    }

    #[test]
    fn test_channel_error_is_surfaced_not_fatal() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Open));

        let event = m.handle_event(ProviderEvent::ChannelError("sctp abort".to_string()));
        assert_eq!(event, Some(ChannelEvent::Error("sctp abort".to_string())));
        assert_eq!(m.error(), Some("data channel error: sctp abort"));
        assert!(m.is_channel_open());
    }

    #[test]
    fn test_retry_for_initiator_recreates_channel() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        m.retry().unwrap();
        assert_eq!(m.provider().channels_recreated, 1);
        assert_eq!(m.channel_state(), Some(DataChannelState::Connecting));
    }

    #[test]
    fn test_retry_for_responder_is_refused() {
        let mut m = manager();
        m.accept_offer(&offer_text(), Instant::now()).unwrap();
        let err = m.retry().unwrap_err();
        assert!(err.to_string().contains("ask them to retry"));
        assert_eq!(m.provider().channels_recreated, 0);
    }

    #[test]
    fn test_failure_keeps_peer_connection() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        m.handle_event(ProviderEvent::PeerStateChanged(PeerConnectionState::Failed));

        assert_eq!(m.peer_state(), PeerConnectionState::Failed);
        assert_eq!(m.status(), "Connection failed: restart to try again");
        assert!(!m.provider().closed);
        assert_eq!(m.provider().initialized, 1);
    }

    #[test]
    fn test_close_stops_dispatch() {
        let mut m = manager();
        m.create_offer(Instant::now()).unwrap();
        m.close();
        assert!(m.provider().closed);

        m.provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        assert!(m.pump_events().is_empty());
        assert_eq!(m.status(), "Connection closed");
    }

    #[test]
    fn test_status_walkthrough() {
        let mut m = manager();
        assert_eq!(m.status(), "Not connected: create an offer or accept one");

        let start = Instant::now();
        m.create_offer(start).unwrap();
        m.tick(start + DELAY);
        assert!(m.status().starts_with("Offer ready"));

        m.apply_answer(&FakeProvider::answer_description().to_text().unwrap())
            .unwrap();
        assert_eq!(m.status(), "Answer set, connecting...");

        m.handle_event(ProviderEvent::PeerStateChanged(PeerConnectionState::Connecting));
        assert_eq!(m.status(), "Connecting to peer...");

        m.handle_event(ProviderEvent::PeerStateChanged(PeerConnectionState::Connected));
        assert_eq!(m.status(), "Peer connected, waiting for data channel...");

        m.handle_event(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        assert_eq!(m.status(), "Connected: data channel open");
    }
}
