// WebRTC runtime using str0m Sans-I/O implementation
// The Rtc instance lives on a network thread that owns the UDP socket; the UI talks to it
// through command/event channels and blocks only for the short negotiation replies

use anyhow::{anyhow, Result};
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use str0m::change::{SdpAnswer, SdpOffer, SdpPendingOffer};
use str0m::channel::{ChannelConfig, ChannelId, Reliability};
use str0m::net::{Protocol, Receive};
use str0m::{Candidate, Event, IceConnectionState, Input, Output, Rtc};

use super::description::{SdpType, SessionDescription};
use super::error::ConnectionError;
use super::provider::{
    ChannelOptions, DataChannelState, NegotiationProvider, PeerConnectionState, ProviderEvent,
};

type Reply<T> = mpsc::Sender<Result<T, ConnectionError>>;

/// Commands the UI thread sends to the network thread
enum RuntimeCommand {
    AddChannel(ChannelOptions, Reply<()>),
    RecreateChannel(ChannelOptions, Reply<()>),
    CreateOffer(Reply<SessionDescription>),
    CreateAnswer(Reply<SessionDescription>),
    SetLocal(SessionDescription, Reply<()>),
    SetRemote(SessionDescription, Reply<()>),
    Send(String, Reply<()>),
    Close,
}

/// Handle held by the connection manager
pub struct WebRtcProvider {
    cmd_tx: Option<mpsc::Sender<RuntimeCommand>>,
    event_rx: Option<mpsc::Receiver<ProviderEvent>>,
    alive: Arc<AtomicBool>,
    local: Option<SessionDescription>,
    stun_timeout: Duration,
}

impl WebRtcProvider {
    pub fn new(stun_timeout: Duration) -> Self {
        Self {
            cmd_tx: None,
            event_rx: None,
            alive: Arc::new(AtomicBool::new(false)),
            local: None,
            stun_timeout,
        }
    }

    /// Send a command and wait for the network thread's reply
    fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> RuntimeCommand,
    ) -> Result<T, ConnectionError> {
        let cmd_tx = self
            .cmd_tx
            .as_ref()
            .ok_or_else(|| ConnectionError::Provider("not initialized".to_string()))?;
        let (reply_tx, reply_rx) = mpsc::channel();
        cmd_tx
            .send(make(reply_tx))
            .map_err(|_| ConnectionError::Provider("network thread stopped".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| ConnectionError::Provider("network thread stopped".to_string()))?
    }
}

impl NegotiationProvider for WebRtcProvider {
    fn initialize(&mut self, stun_servers: &[String]) -> Result<(), ConnectionError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (event_tx, event_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        self.alive.store(true, Ordering::Relaxed);

        spawn_network_thread(
            stun_servers.to_vec(),
            self.stun_timeout,
            event_tx,
            cmd_rx,
            self.alive.clone(),
        )
        .map_err(|e| ConnectionError::Provider(e.to_string()))?;

        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        Ok(())
    }

    fn create_data_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError> {
        let options = options.clone();
        self.request(|reply| RuntimeCommand::AddChannel(options, reply))
    }

    fn recreate_data_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError> {
        let options = options.clone();
        self.request(|reply| RuntimeCommand::RecreateChannel(options, reply))
    }

    fn create_offer(&mut self) -> Result<SessionDescription, ConnectionError> {
        self.request(RuntimeCommand::CreateOffer)
    }

    fn create_answer(&mut self) -> Result<SessionDescription, ConnectionError> {
        self.request(RuntimeCommand::CreateAnswer)
    }

    fn set_local_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError> {
        let copy = description.clone();
        self.request(|reply| RuntimeCommand::SetLocal(copy, reply))?;
        self.local = Some(description.clone());
        Ok(())
    }

    fn set_remote_description(&mut self, description: &SessionDescription) -> Result<(), ConnectionError> {
        let copy = description.clone();
        self.request(|reply| RuntimeCommand::SetRemote(copy, reply))
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.local.clone()
    }

    fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        let text = text.to_string();
        self.request(|reply| RuntimeCommand::Send(text, reply))
    }

    fn poll_event(&mut self) -> Option<ProviderEvent> {
        self.event_rx.as_ref()?.try_recv().ok()
    }

    fn close(&mut self) {
        if let Some(cmd_tx) = self.cmd_tx.take() {
            let _ = cmd_tx.send(RuntimeCommand::Close);
        }
        self.event_rx = None;
        self.alive.store(false, Ordering::Relaxed);
    }
}

impl Drop for WebRtcProvider {
    fn drop(&mut self) {
        self.close();
    }
}

/// Discover the local network IP address for LAN connectivity
///
/// Private ranges are ranked so a home network wins over VPN or other interfaces
fn discover_local_ip() -> Result<IpAddr> {
    let interfaces = if_addrs::get_if_addrs()
        .map_err(|e| anyhow!("Failed to get network interfaces: {}", e))?;

    let mut candidates: Vec<(String, IpAddr)> = interfaces
        .into_iter()
        .filter_map(|iface| match iface.addr.ip() {
            IpAddr::V4(ipv4) if !ipv4.is_loopback() => Some((iface.name, IpAddr::V4(ipv4))),
            _ => None,
        })
        .collect();

    debug!(
        candidates = ?candidates.iter().map(|(name, ip)| format!("{}={}", name, ip)).collect::<Vec<_>>(),
        "IPv4 interfaces"
    );

    candidates.sort_by_key(|(_, ip)| interface_rank(ip));

    let (name, ip) = candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No suitable network interfaces found"))?;
    info!(interface = %name, %ip, "selected local interface");
    Ok(ip)
}

fn interface_rank(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            if octets[0] == 192 && octets[1] == 168 {
                0
            } else if octets[0] == 172 && (16..=31).contains(&octets[1]) {
                1
            } else if octets[0] == 10 {
                2
            } else {
                3
            }
        }
        IpAddr::V6(_) => 99,
    }
}

/// Query a STUN server for our public address.
/// Must use the ICE socket itself, otherwise the NAT mapping differs from the one peers see.
async fn query_stun_server(
    udp_socket: &UdpSocket,
    stun_addr: SocketAddr,
    timeout: Duration,
) -> Result<SocketAddr> {
    let socket_clone = udp_socket.try_clone()?;
    let client = stunclient::StunClient::new(stun_addr);

    let public_addr = tokio::task::spawn_blocking(
        move || -> Result<SocketAddr, Box<dyn std::error::Error + Send + Sync>> {
            socket_clone.set_read_timeout(Some(timeout))?;
            let result = client.query_external_address(&socket_clone)?;
            Ok(result)
        },
    )
    .await?
    .map_err(|e| anyhow!("STUN query failed: {}", e))?;

    Ok(public_addr)
}

/// Resolve every configured STUN server to an IPv4 address, concurrently
async fn resolve_stun_servers(servers: &[String]) -> Vec<(String, SocketAddr)> {
    let lookups = servers.iter().map(|server| async move {
        let addr = tokio::net::lookup_host(server.as_str())
            .await
            .ok()
            .and_then(|mut addrs| addrs.find(|addr| addr.is_ipv4()));
        (server.clone(), addr)
    });

    futures::future::join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(server, addr)| match addr {
            Some(addr) => Some((server, addr)),
            None => {
                warn!(%server, "could not resolve STUN server");
                None
            }
        })
        .collect()
}

/// Build the Rtc instance, bind the ICE socket and gather host + server reflexive candidates
async fn gather_candidates(
    stun_servers: &[String],
    stun_timeout: Duration,
    event_tx: &mpsc::Sender<ProviderEvent>,
) -> Result<(Rtc, UdpSocket)> {
    let mut rtc = Rtc::builder()
        .set_rtp_mode(false) // Data channels only, no RTP media
        .build();

    let local_ip = discover_local_ip().unwrap_or_else(|e| {
        warn!(error = %e, "falling back to loopback");
        IpAddr::from([127, 0, 0, 1])
    });

    // Bind to the specific IP so local_addr() matches the host candidate
    let udp_socket = UdpSocket::bind(SocketAddr::new(local_ip, 0))?;
    let host_addr = udp_socket.local_addr()?;
    info!(%host_addr, "bound UDP socket");

    let host = Candidate::host(host_addr, "udp")
        .map_err(|e| anyhow!("Failed to create local candidate: {}", e))?;
    rtc.add_local_candidate(host)
        .ok_or_else(|| anyhow!("Failed to add local candidate to Rtc"))?;
    let _ = event_tx.send(ProviderEvent::CandidateGathered(format!("host {}", host_addr)));

    // First STUN server that answers wins; without any we still work on the LAN
    for (server, stun_addr) in resolve_stun_servers(stun_servers).await {
        match query_stun_server(&udp_socket, stun_addr, stun_timeout).await {
            Ok(public_addr) => {
                info!(%server, %public_addr, "public address from STUN");
                match Candidate::server_reflexive(public_addr, host_addr, "udp") {
                    Ok(srflx) => {
                        if rtc.add_local_candidate(srflx).is_some() {
                            let _ = event_tx.send(ProviderEvent::CandidateGathered(format!(
                                "srflx {}",
                                public_addr
                            )));
                        } else {
                            warn!("Failed to add server reflexive candidate");
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to create server reflexive candidate"),
                }
                break;
            }
            Err(e) => warn!(%server, error = %e, "STUN query failed"),
        }
    }

    Ok((rtc, udp_socket))
}

/// Spawn the network thread: candidate gathering first, then the str0m polling loop
fn spawn_network_thread(
    stun_servers: Vec<String>,
    stun_timeout: Duration,
    event_tx: mpsc::Sender<ProviderEvent>,
    cmd_rx: mpsc::Receiver<RuntimeCommand>,
    alive: Arc<AtomicBool>,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name("p2ptoe-webrtc".to_string())
        .spawn(move || {
            info!("network thread started");

            // Tokio is only needed while resolving and querying STUN servers
            let setup = Runtime::new()
                .map_err(anyhow::Error::from)
                .and_then(|rt| rt.block_on(gather_candidates(&stun_servers, stun_timeout, &event_tx)));

            match setup {
                Ok((rtc, udp_socket)) => {
                    let mut runtime = NetworkLoop::new(rtc, udp_socket, event_tx.clone());
                    if let Err(e) = runtime.run(&cmd_rx, &alive) {
                        error!(error = %e, "network loop error");
                        let _ = event_tx.send(ProviderEvent::PeerStateChanged(
                            PeerConnectionState::Failed,
                        ));
                    }
                }
                Err(e) => {
                    error!(error = %e, "network setup failed");
                    let _ = event_tx.send(ProviderEvent::PeerStateChanged(PeerConnectionState::Failed));
                }
            }

            alive.store(false, Ordering::Relaxed);
            info!("network thread ending");
        })?;

    Ok(())
}

/// State owned by the network thread
struct NetworkLoop {
    rtc: Rtc,
    udp_socket: UdpSocket,
    event_tx: mpsc::Sender<ProviderEvent>,
    /// Channel requested before the offer is built
    pending_channel: Option<ChannelOptions>,
    /// Offer we sent, waiting for its answer
    pending_offer: Option<SdpPendingOffer>,
    /// Remote offer waiting for create_answer
    remote_offer: Option<SdpOffer>,
    channel_id: Option<ChannelId>,
    /// Set when this side created the channel; otherwise any channel the peer opens replaces it
    local_channel: bool,
    /// str0m's requested wake-up time
    deadline: Option<Instant>,
}

fn negotiation<E: std::fmt::Display>(e: E) -> ConnectionError {
    ConnectionError::Negotiation(e.to_string())
}

fn channel_config(options: &ChannelOptions) -> ChannelConfig {
    ChannelConfig {
        label: options.label.clone(),
        ordered: options.ordered,
        reliability: Reliability::Reliable,
        negotiated: None,
        protocol: String::new(),
    }
}

impl NetworkLoop {
    fn new(rtc: Rtc, udp_socket: UdpSocket, event_tx: mpsc::Sender<ProviderEvent>) -> Self {
        Self {
            rtc,
            udp_socket,
            event_tx,
            pending_channel: None,
            pending_offer: None,
            remote_offer: None,
            channel_id: None,
            local_channel: false,
            deadline: None,
        }
    }

    fn emit(&self, event: ProviderEvent) {
        let _ = self.event_tx.send(event);
    }

    fn run(&mut self, cmd_rx: &mpsc::Receiver<RuntimeCommand>, alive: &AtomicBool) -> Result<()> {
        info!("starting WebRTC polling loop");
        let mut buf = vec![0u8; 8192];

        // Short socket timeout so commands are drained frequently
        self.udp_socket
            .set_read_timeout(Some(Duration::from_millis(10)))?;

        loop {
            // Phase 1: Poll str0m for outputs
            loop {
                match self.rtc.poll_output()? {
                    Output::Transmit(transmit) => {
                        if let Err(e) = self
                            .udp_socket
                            .send_to(&transmit.contents, transmit.destination)
                        {
                            warn!(error = %e, "failed to send UDP packet");
                        }
                    }
                    Output::Timeout(deadline) => {
                        self.deadline = Some(deadline);
                        break;
                    }
                    Output::Event(event) => self.handle_str0m_event(event),
                }
            }

            // Phase 2: Wait for UDP input or timeout
            match self.udp_socket.recv_from(&mut buf) {
                Ok((n, source)) => {
                    let receive = Receive {
                        proto: Protocol::Udp,
                        source,
                        destination: self.udp_socket.local_addr()?,
                        contents: buf[..n].try_into()?,
                    };
                    self.rtc.handle_input(Input::Receive(Instant::now(), receive))?;
                    self.deadline = None;
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    // Only wake str0m once its deadline is reached
                    let now = Instant::now();
                    if self.deadline.map_or(true, |deadline| now >= deadline) {
                        self.rtc.handle_input(Input::Timeout(now))?;
                        self.deadline = None;
                    }
                }
                Err(e) => return Err(e.into()),
            }

            // Phase 3: Process commands from the UI (non-blocking)
            loop {
                match cmd_rx.try_recv() {
                    Ok(RuntimeCommand::Close) => {
                        self.rtc.disconnect();
                        self.emit(ProviderEvent::PeerStateChanged(PeerConnectionState::Closed));
                        return Ok(());
                    }
                    Ok(command) => self.handle_command(command),
                    Err(mpsc::TryRecvError::Empty) => break,
                    // Handle dropped without close
                    Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
                }
            }

            if !alive.load(Ordering::Relaxed) {
                return Ok(());
            }
        }
    }

    fn handle_command(&mut self, command: RuntimeCommand) {
        match command {
            RuntimeCommand::AddChannel(options, reply) => {
                self.pending_channel = Some(options);
                let _ = reply.send(Ok(()));
            }
            RuntimeCommand::RecreateChannel(options, reply) => {
                let _ = reply.send(self.recreate_channel(&options));
            }
            RuntimeCommand::CreateOffer(reply) => {
                let _ = reply.send(self.create_offer());
            }
            RuntimeCommand::CreateAnswer(reply) => {
                let _ = reply.send(self.create_answer());
            }
            RuntimeCommand::SetLocal(description, reply) => {
                // str0m commits the local side when the offer/answer is built;
                // candidates are already embedded, so gathering is done here
                debug!(
                    kind = description.sdp_type.label(),
                    candidates = description.candidate_count(),
                    "local description committed"
                );
                self.emit(ProviderEvent::GatheringComplete);
                let _ = reply.send(Ok(()));
            }
            RuntimeCommand::SetRemote(description, reply) => {
                let _ = reply.send(self.set_remote(description));
            }
            RuntimeCommand::Send(text, reply) => {
                let _ = reply.send(self.send(&text));
            }
            RuntimeCommand::Close => {}
        }
    }

    fn create_offer(&mut self) -> Result<SessionDescription, ConnectionError> {
        let mut change = self.rtc.sdp_api();
        if let Some(options) = self.pending_channel.take() {
            let cid = change.add_channel_with_config(channel_config(&options));
            info!(label = %options.label, ?cid, "data channel added to offer");
            self.channel_id = Some(cid);
            self.local_channel = true;
        }
        let (offer, pending) = change
            .apply()
            .ok_or_else(|| ConnectionError::Negotiation("nothing to negotiate".to_string()))?;
        self.pending_offer = Some(pending);
        Ok(SessionDescription::offer(offer.to_sdp_string()))
    }

    fn create_answer(&mut self) -> Result<SessionDescription, ConnectionError> {
        let offer = self
            .remote_offer
            .take()
            .ok_or_else(|| ConnectionError::Negotiation("no remote offer to answer".to_string()))?;
        let answer = self.rtc.sdp_api().accept_offer(offer).map_err(negotiation)?;
        Ok(SessionDescription::answer(answer.to_sdp_string()))
    }

    fn set_remote(&mut self, description: SessionDescription) -> Result<(), ConnectionError> {
        match description.sdp_type {
            SdpType::Offer => {
                let offer = SdpOffer::from_sdp_string(&description.sdp).map_err(negotiation)?;
                self.remote_offer = Some(offer);
            }
            SdpType::Answer => {
                let answer = SdpAnswer::from_sdp_string(&description.sdp).map_err(negotiation)?;
                let pending = self.pending_offer.take().ok_or_else(|| {
                    ConnectionError::Negotiation("no offer is waiting for an answer".to_string())
                })?;
                self.rtc
                    .sdp_api()
                    .accept_answer(pending, answer)
                    .map_err(negotiation)?;
                self.emit(ProviderEvent::PeerStateChanged(PeerConnectionState::Connecting));
            }
        }
        Ok(())
    }

    fn recreate_channel(&mut self, options: &ChannelOptions) -> Result<(), ConnectionError> {
        let mut api = self.rtc.direct_api();
        if let Some(cid) = self.channel_id.take() {
            api.close_data_channel(cid);
        }
        let cid = api.create_data_channel(channel_config(options));
        self.channel_id = Some(cid);
        self.local_channel = true;
        self.emit(ProviderEvent::ChannelStateChanged(DataChannelState::Connecting));
        Ok(())
    }

    fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        let cid = self.channel_id.ok_or(ConnectionError::ChannelNotOpen)?;
        let mut channel = self
            .rtc
            .channel(cid)
            .ok_or(ConnectionError::ChannelNotOpen)?;
        channel
            .write(false, text.as_bytes())
            .map_err(|e| ConnectionError::Channel(e.to_string()))?;
        Ok(())
    }

    fn handle_str0m_event(&mut self, event: Event) {
        match event {
            Event::Connected => {
                info!("WebRTC connection established (ICE + DTLS)");
                self.emit(ProviderEvent::PeerStateChanged(PeerConnectionState::Connected));
            }
            Event::IceConnectionStateChange(state) => {
                debug!(?state, "ICE state");
                match state {
                    IceConnectionState::New => {
                        self.emit(ProviderEvent::PeerStateChanged(PeerConnectionState::New));
                    }
                    IceConnectionState::Checking => {
                        self.emit(ProviderEvent::PeerStateChanged(PeerConnectionState::Connecting));
                    }
                    IceConnectionState::Disconnected => {
                        info!("ICE connection disconnected");
                        self.emit(ProviderEvent::PeerStateChanged(
                            PeerConnectionState::Disconnected,
                        ));
                    }
                    // Event::Connected is the real readiness signal
                    IceConnectionState::Connected | IceConnectionState::Completed => {}
                }
            }
            Event::ChannelOpen(cid, label) => {
                info!(%label, ?cid, "data channel opened");
                if !self.local_channel {
                    // Responder side: the newest channel from the other peer wins
                    if self.channel_id != Some(cid) {
                        self.channel_id = Some(cid);
                        self.emit(ProviderEvent::RemoteChannel { label });
                    }
                    self.emit(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
                } else if self.channel_id == Some(cid) {
                    self.emit(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
                }
            }
            Event::ChannelData(data) => {
                if Some(data.id) != self.channel_id {
                    return;
                }
                match String::from_utf8(data.data) {
                    Ok(text) => self.emit(ProviderEvent::ChannelMessage(text)),
                    Err(_) => self.emit(ProviderEvent::ChannelError(
                        "received a non-text frame".to_string(),
                    )),
                }
            }
            Event::ChannelClose(cid) => {
                if Some(cid) == self.channel_id {
                    info!(?cid, "data channel closed");
                    if !self.local_channel {
                        self.channel_id = None;
                    }
                    self.emit(ProviderEvent::ChannelStateChanged(DataChannelState::Closed));
                }
            }
            _ => {}
        }
    }
}
