use std::io;

use ratatui::{layout::Rect, Frame, Terminal};

use crate::config::{Config, DisplayConfig, KeyBindings};
use crate::game::{GameState, InputAction, Screen};
use crate::network::{NegotiationProvider, Session};
use crate::ui::{self, OverlayMessage};

use super::common::{negotiation_hints, run_demo, DemoScreen};

/// Tic-tac-toe screen: board cursor plus the shared negotiation controls
#[derive(Debug, Default)]
pub struct TicTacToeScreen {
    cursor: usize,
}

/// Move the cursor one cell, wrapping at the edges
fn move_cursor(cursor: usize, dx: i8, dy: i8) -> usize {
    let col = (cursor % 3) as i8;
    let row = (cursor / 3) as i8;
    let col = (col + dx).rem_euclid(3) as usize;
    let row = (row + dy).rem_euclid(3) as usize;
    row * 3 + col
}

impl TicTacToeScreen {
    fn place<P: NegotiationProvider>(&mut self, session: &mut Session<P, GameState>, index: usize) {
        self.cursor = index;
        if let Err(e) = session.make_move(index) {
            session.surface(e);
        }
    }
}

impl DemoScreen for TicTacToeScreen {
    type App = GameState;

    const SCREEN: Screen = Screen::TicTacToe;

    fn title(&self, app: &GameState) -> String {
        match app.local_mark {
            Some(mark) => format!("Tic-Tac-Toe: playing {}", mark.as_str()),
            None => "Tic-Tac-Toe".to_string(),
        }
    }

    fn handle_action<P: NegotiationProvider>(
        &mut self,
        session: &mut Session<P, GameState>,
        action: InputAction,
    ) {
        match action {
            InputAction::Place(index) => self.place(session, index),
            InputAction::PlaceAtCursor => self.place(session, self.cursor),
            InputAction::MoveCursor(dx, dy) => self.cursor = move_cursor(self.cursor, dx, dy),
            InputAction::PlayAgain => {
                if let Err(e) = session.play_again() {
                    session.surface(e);
                }
            }
            _ => {}
        }
    }

    fn hints(&self, bindings: &KeyBindings) -> Vec<(String, &'static str)> {
        let mut hints = vec![
            ("Arrows/1-9".to_string(), "Move"),
            (bindings.play_again.clone(), "New round"),
        ];
        hints.extend(negotiation_hints(bindings));
        hints
    }

    fn render(&self, frame: &mut Frame, area: Rect, app: &GameState, display: &DisplayConfig) {
        ui::render_board(frame, area, app, self.cursor, display);

        if let Some(result) = app.result_text() {
            let message = OverlayMessage::success(vec![
                result,
                String::new(),
                "N to play again".to_string(),
            ]);
            ui::render_overlay(frame, &message, area);
        }
    }
}

pub fn run_tictactoe<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
) -> Result<(), io::Error> {
    let label = config.network.game_channel_label.clone();
    run_demo(terminal, config, &label, TicTacToeScreen::default(), GameState::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, MoveRejected};
    use crate::network::provider::{ChannelOptions, DataChannelState, ProviderEvent};
    use crate::network::testing::FakeProvider;
    use crate::network::ConnectionManager;
    use std::time::{Duration, Instant};

    fn open_session() -> Session<FakeProvider, GameState> {
        let connection = ConnectionManager::new(
            FakeProvider::default(),
            Vec::new(),
            ChannelOptions::ordered("tictactoe"),
            Duration::from_millis(500),
        );
        let mut session = Session::new(connection, GameState::new());
        session.create_offer(Instant::now()).unwrap();
        session
            .connection
            .provider_mut()
            .push(ProviderEvent::ChannelStateChanged(DataChannelState::Open));
        session.pump();
        session
    }

    #[test]
    fn test_cursor_wraps() {
        assert_eq!(move_cursor(0, -1, 0), 2);
        assert_eq!(move_cursor(0, 0, -1), 6);
        assert_eq!(move_cursor(4, 1, 1), 8);
        assert_eq!(move_cursor(8, 1, 0), 6);
    }

    #[test]
    fn test_place_at_cursor_sends_move() {
        let mut session = open_session();
        let mut screen = TicTacToeScreen::default();

        screen.handle_action(&mut session, InputAction::MoveCursor(1, 1));
        screen.handle_action(&mut session, InputAction::PlaceAtCursor);

        assert_eq!(session.app.board[4], Cell::X);
        assert_eq!(session.connection.provider().sent.len(), 1);
    }

    #[test]
    fn test_rejected_move_shows_error() {
        let mut session = open_session();
        let mut screen = TicTacToeScreen::default();

        screen.handle_action(&mut session, InputAction::Place(0));
        screen.handle_action(&mut session, InputAction::Place(1));

        assert_eq!(screen.cursor, 1);
        assert_eq!(
            session.connection.error(),
            Some(MoveRejected::NotYourTurn.to_string().as_str())
        );
    }

    #[test]
    fn test_title_names_mark() {
        let session = open_session();
        let screen = TicTacToeScreen::default();
        assert_eq!(screen.title(&session.app), "Tic-Tac-Toe: playing X");
    }
}
