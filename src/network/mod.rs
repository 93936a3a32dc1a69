// Networking for the two demos
// Manual offer/answer negotiation, one data channel per session, JSON frames on top

pub mod connection;
pub mod description;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod webrtc_runtime;

#[cfg(test)]
pub mod testing;

pub use connection::ConnectionManager;
pub use description::{SdpType, SessionDescription};
pub use provider::{ChannelOptions, NegotiationProvider};
pub use session::{Application, Session};
pub use webrtc_runtime::WebRtcProvider;

use std::time::Duration;

use crate::config::NetworkConfig;

/// Build a session backed by the str0m runtime for the given channel label
pub fn start_session<A: Application>(
    config: &NetworkConfig,
    label: &str,
    app: A,
) -> Session<WebRtcProvider, A> {
    let provider = WebRtcProvider::new(Duration::from_secs(config.stun_timeout_secs));
    let connection = ConnectionManager::new(
        provider,
        config.stun_servers.clone(),
        ChannelOptions::ordered(label),
        Duration::from_millis(config.gathering_delay_ms),
    );
    Session::new(connection, app)
}
