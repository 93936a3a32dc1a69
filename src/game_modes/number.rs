use std::io;

use ratatui::{layout::Rect, Frame, Terminal};

use crate::config::{Config, DisplayConfig, KeyBindings};
use crate::game::{InputAction, NumberState, Screen};
use crate::network::{NegotiationProvider, Session};
use crate::ui;

use super::common::{negotiation_hints, run_demo, DemoScreen};

/// Number transfer screen: type a number, Enter sends it
#[derive(Debug, Default)]
pub struct NumberScreen;

impl DemoScreen for NumberScreen {
    type App = NumberState;

    const SCREEN: Screen = Screen::NumberTransfer;

    fn title(&self, _app: &NumberState) -> String {
        "Number Transfer".to_string()
    }

    fn handle_action<P: NegotiationProvider>(
        &mut self,
        session: &mut Session<P, NumberState>,
        action: InputAction,
    ) {
        match action {
            InputAction::Digit(c) => {
                session.app.push_char(c);
            }
            InputAction::Backspace => session.app.backspace(),
            InputAction::StepNumber(step) => {
                let value = session.app.local_value.saturating_add(step);
                session.app.set_local_value(value);
            }
            InputAction::SendNumber => {
                if let Err(e) = session.send_number() {
                    session.surface(e);
                }
            }
            _ => {}
        }
    }

    fn hints(&self, bindings: &KeyBindings) -> Vec<(String, &'static str)> {
        let mut hints = vec![
            ("0-9/-".to_string(), "Edit"),
            ("Up/Down".to_string(), "Step"),
            ("Enter".to_string(), "Send"),
        ];
        hints.extend(negotiation_hints(bindings));
        hints
    }

    fn render(&self, frame: &mut Frame, area: Rect, app: &NumberState, _display: &DisplayConfig) {
        ui::render_number(frame, area, app);
    }
}

pub fn run_number_transfer<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
) -> Result<(), io::Error> {
    let label = config.network.number_channel_label.clone();
    run_demo(terminal, config, &label, NumberScreen, NumberState::new())
}
