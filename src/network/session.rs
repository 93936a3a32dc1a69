// Session glue between the connection manager and a demo's state
// User actions land here; failures become the error line on screen

use std::time::Instant;

use tracing::{debug, info, warn};

use super::connection::{ChannelEvent, ConnectionManager, Role};
use super::description::SessionDescription;
use super::error::ConnectionError;
use super::protocol::{decode_number, encode_number, GameMessage};
use super::provider::NegotiationProvider;
use crate::game::{GameState, Mark, MoveRejected, NumberState};

/// State driven by the data channel
pub trait Application {
    fn assign_role(&mut self, role: Role);

    fn on_channel_open(&mut self);

    fn on_message(&mut self, text: &str) -> Result<(), ConnectionError>;

    fn on_channel_closed(&mut self);
}

/// Failure of a user action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Move(#[from] MoveRejected),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

pub struct Session<P, A> {
    pub connection: ConnectionManager<P>,
    pub app: A,
}

impl<P: NegotiationProvider, A: Application> Session<P, A> {
    pub fn new(connection: ConnectionManager<P>, app: A) -> Self {
        Self { connection, app }
    }

    pub fn create_offer(&mut self, now: Instant) -> Result<(), ConnectionError> {
        self.connection.create_offer(now)?;
        self.app.assign_role(Role::Initiator);
        Ok(())
    }

    pub fn accept_offer(&mut self, text: &str, now: Instant) -> Result<(), ConnectionError> {
        self.connection.accept_offer(text, now)?;
        self.app.assign_role(Role::Responder);
        Ok(())
    }

    pub fn apply_answer(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.connection.apply_answer(text)
    }

    pub fn retry(&mut self) -> Result<(), ConnectionError> {
        self.connection.retry()
    }

    pub fn tick(&mut self, now: Instant) -> Option<SessionDescription> {
        self.connection.tick(now)
    }

    /// Drain provider events and feed channel events to the application
    pub fn pump(&mut self) {
        for event in self.connection.pump_events() {
            self.dispatch(event);
        }
    }

    pub fn dispatch(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => self.app.on_channel_open(),
            ChannelEvent::Message(text) => {
                if let Err(e) = self.app.on_message(&text) {
                    warn!(error = %e, "dropping undecodable frame");
                    self.connection.set_error(e.to_string());
                }
            }
            ChannelEvent::Closed => self.app.on_channel_closed(),
            // Already surfaced by the connection manager
            ChannelEvent::Error(_) => {}
        }
    }

    /// Show a failed action on the error line
    pub fn surface<E: std::fmt::Display>(&mut self, error: E) {
        debug!(%error, "action failed");
        self.connection.set_error(error.to_string());
    }

    pub fn close(&mut self) {
        self.connection.close();
    }
}

impl Application for GameState {
    fn assign_role(&mut self, role: Role) {
        let mark = match role {
            Role::Initiator => Mark::X,
            Role::Responder => Mark::O,
        };
        info!(mark = mark.as_str(), "playing as");
        self.assign(mark);
    }

    fn on_channel_open(&mut self) {
        self.channel_opened();
    }

    fn on_message(&mut self, text: &str) -> Result<(), ConnectionError> {
        match GameMessage::from_text(text)? {
            GameMessage::Move { board } => self.apply_remote_move(board),
            GameMessage::Reset => self.apply_reset(),
        }
        Ok(())
    }

    fn on_channel_closed(&mut self) {
        self.channel_closed();
    }
}

impl<P: NegotiationProvider> Session<P, GameState> {
    /// Place the local mark. The move stays on the local board even when the send fails.
    pub fn make_move(&mut self, index: usize) -> Result<(), ActionError> {
        let board = self.app.try_local_move(index)?;
        self.connection.clear_error();
        let frame = GameMessage::Move { board }.to_text()?;
        self.connection.send(&frame)?;
        Ok(())
    }

    /// Start a new round locally and tell the peer
    pub fn play_again(&mut self) -> Result<(), ActionError> {
        if self.app.local_mark.is_none() {
            return Err(MoveRejected::NoRole.into());
        }
        self.app.apply_reset();
        self.connection.clear_error();
        let frame = GameMessage::Reset.to_text()?;
        self.connection.send(&frame)?;
        Ok(())
    }
}

impl Application for NumberState {
    fn assign_role(&mut self, _role: Role) {
        self.received_value = None;
    }

    fn on_channel_open(&mut self) {
        self.channel_ready = true;
    }

    fn on_message(&mut self, text: &str) -> Result<(), ConnectionError> {
        let value = decode_number(text)?;
        self.receive(value);
        Ok(())
    }

    fn on_channel_closed(&mut self) {
        self.channel_ready = false;
    }
}

impl<P: NegotiationProvider> Session<P, NumberState> {
    pub fn send_number(&mut self) -> Result<(), ConnectionError> {
        let text = encode_number(self.app.local_value);
        self.connection.send(&text)?;
        self.connection.clear_error();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::board_from;
    use crate::game::board::GameResult;
    use crate::game::Cell;
    use crate::network::provider::{ChannelOptions, DataChannelState, ProviderEvent};
    use crate::network::testing::FakeProvider;
    use std::time::Duration;

    const DELAY: Duration = Duration::from_millis(500);

    fn session<A: Application>(app: A) -> Session<FakeProvider, A> {
        let connection = ConnectionManager::new(
            FakeProvider::default(),
            Vec::new(),
            ChannelOptions::ordered("test"),
            DELAY,
        );
        Session::new(connection, app)
    }

    fn open<A: Application>(s: &mut Session<FakeProvider, A>) {
        s.connection
            .provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        s.pump();
    }

    /// Two connected game sessions, X first
    fn connected_pair() -> (Session<FakeProvider, GameState>, Session<FakeProvider, GameState>) {
        let start = Instant::now();
        let mut x = session(GameState::new());
        let mut o = session(GameState::new());

        x.create_offer(start).unwrap();
        let offer = x.tick(start + DELAY).unwrap();
        o.accept_offer(&offer.to_labelled_text().unwrap(), start).unwrap();
        let answer = o.tick(start + DELAY).unwrap();
        x.apply_answer(&answer.to_text().unwrap()).unwrap();

        open(&mut x);
        o.connection.provider_mut().push(ProviderEvent::RemoteChannel {
            label: "test".to_string(),
        });
        open(&mut o);
        (x, o)
    }

    /// Move every frame `from` sent into `to`'s event queue and process it
    fn deliver<A: Application, B: Application>(
        from: &mut Session<FakeProvider, A>,
        to: &mut Session<FakeProvider, B>,
    ) {
        for text in from.connection.provider_mut().sent.drain(..).collect::<Vec<_>>() {
            to.connection
                .provider_mut()
                .push(ProviderEvent::ChannelMessage(text));
        }
        to.pump();
    }

    #[test]
    fn test_roles_assign_marks() {
        let (x, o) = connected_pair();
        assert_eq!(x.app.local_mark, Some(Mark::X));
        assert_eq!(o.app.local_mark, Some(Mark::O));
        assert!(x.app.my_turn);
        assert!(!o.app.my_turn);
    }

    #[test]
    fn test_full_game_between_peers() {
        let (mut x, mut o) = connected_pair();

        // X takes the top row while O plays the middle row
        for (x_cell, o_cell) in [(0, 3), (1, 4)] {
            x.make_move(x_cell).unwrap();
            deliver(&mut x, &mut o);
            o.make_move(o_cell).unwrap();
            deliver(&mut o, &mut x);
        }
        x.make_move(2).unwrap();
        deliver(&mut x, &mut o);

        assert_eq!(x.app.board, o.app.board);
        assert_eq!(x.app.result, GameResult::Win(Mark::X));
        assert_eq!(o.app.result, GameResult::Win(Mark::X));
        assert_eq!(x.app.scores.x_wins, 1);
        assert_eq!(o.app.scores.x_wins, 1);

        // O has the turn flag but the game is over
        assert!(matches!(
            o.make_move(8),
            Err(ActionError::Move(MoveRejected::GameOver))
        ));
    }

    #[test]
    fn test_reset_from_second_mover_still_lets_first_mover_start() {
        let (mut x, mut o) = connected_pair();
        x.make_move(0).unwrap();
        deliver(&mut x, &mut o);

        o.play_again().unwrap();
        deliver(&mut o, &mut x);

        assert!(x.app.my_turn);
        assert!(!o.app.my_turn);
        assert_eq!(x.app.board, crate::game::board::empty_board());
    }

    #[test]
    fn test_move_while_channel_connecting() {
        let start = Instant::now();
        let mut x = session(GameState::new());
        x.create_offer(start).unwrap();
        // Turn given by hand: the channel never opened
        x.app.my_turn = true;

        let err = x.make_move(4).unwrap_err();

        assert_eq!(err, ActionError::Connection(ConnectionError::ChannelNotOpen));
        assert_eq!(x.app.board[4], Cell::X);
        assert!(!x.app.my_turn);
        assert!(x.connection.provider().sent.is_empty());

        x.surface(&err);
        assert!(x.connection.error().unwrap().starts_with("connection lost"));
    }

    #[test]
    fn test_rejected_move_sends_nothing() {
        let (mut x, mut o) = connected_pair();
        assert!(matches!(
            o.make_move(0),
            Err(ActionError::Move(MoveRejected::NotYourTurn))
        ));
        assert!(o.connection.provider().sent.is_empty());

        x.make_move(0).unwrap();
        deliver(&mut x, &mut o);
        assert!(matches!(
            o.make_move(0),
            Err(ActionError::Move(MoveRejected::CellOccupied))
        ));
    }

    #[test]
    fn test_remote_board_overwrites_local() {
        let (_, mut o) = connected_pair();
        o.app.board = board_from(["O", "O", "", "", "", "", "", "", ""]);
        let sent = board_from(["", "", "", "", "X", "", "", "", ""]);
        o.connection.provider_mut().push(ProviderEvent::ChannelMessage(
            GameMessage::Move { board: sent }.to_text().unwrap(),
        ));
        o.pump();
        assert_eq!(o.app.board, sent);
    }

    #[test]
    fn test_garbage_frame_is_surfaced() {
        let (_, mut o) = connected_pair();
        o.connection
            .provider_mut()
            .push(ProviderEvent::ChannelMessage("not json".to_string()));
        o.pump();
        assert!(o.connection.error().is_some());
        assert!(o.connection.is_channel_open());
    }

    #[test]
    fn test_channel_close_freezes_game() {
        let (mut x, _) = connected_pair();
        x.connection
            .provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Closed));
        x.pump();
        assert!(!x.app.channel_ready);
        assert!(x.app.my_turn);
    }

    #[test]
    fn test_number_transfer() {
        let start = Instant::now();
        let mut a = session(NumberState::new());
        let mut b = session(NumberState::new());
        a.create_offer(start).unwrap();
        let offer = a.tick(start + DELAY).unwrap();
        b.accept_offer(&offer.to_text().unwrap(), start).unwrap();
        open(&mut a);
        open(&mut b);

        for c in "-42".chars() {
            a.app.push_char(c);
        }
        a.send_number().unwrap();
        assert_eq!(a.connection.provider().sent, vec!["-42".to_string()]);

        deliver(&mut a, &mut b);
        assert_eq!(b.app.received_value, Some(-42));
    }

    #[test]
    fn test_number_send_before_open() {
        let mut a = session(NumberState::new());
        a.create_offer(Instant::now()).unwrap();
        assert_eq!(a.send_number(), Err(ConnectionError::ChannelNotOpen));
        assert!(a.connection.provider().sent.is_empty());
    }
}
