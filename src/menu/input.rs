// Menu input handling

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io;
use std::time::Duration;

use super::state::{Demo, MenuItem, MenuState};
use crate::config::KeyBindings;
use crate::game::input::key_matches;

pub enum MenuAction {
    None,
    Start(Demo),
    Quit,
}

/// Wait up to `timeout` for a key and apply it to the menu
pub fn handle_menu_input(
    menu_state: &mut MenuState,
    bindings: &KeyBindings,
    timeout: Duration,
) -> Result<MenuAction, io::Error> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(handle_key_press(menu_state, bindings, key.code));
            }
        }
    }

    Ok(MenuAction::None)
}

fn handle_key_press(menu_state: &mut MenuState, bindings: &KeyBindings, code: KeyCode) -> MenuAction {
    if key_matches(&bindings.menu_up, code) || matches!(code, KeyCode::Char('k') | KeyCode::Char('K')) {
        menu_state.select_previous();
        MenuAction::None
    } else if key_matches(&bindings.menu_down, code)
        || matches!(code, KeyCode::Char('j') | KeyCode::Char('J'))
    {
        menu_state.select_next();
        MenuAction::None
    } else if key_matches(&bindings.menu_select, code) || code == KeyCode::Char(' ') {
        match menu_state.selected_item() {
            MenuItem::TicTacToe => MenuAction::Start(Demo::TicTacToe),
            MenuItem::NumberTransfer => MenuAction::Start(Demo::NumberTransfer),
            MenuItem::Quit => MenuAction::Quit,
        }
    } else if key_matches(&bindings.quit, code) || key_matches(&bindings.menu_back, code) {
        MenuAction::Quit
    } else {
        MenuAction::None
    }
}
