use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::KeyBindings;

/// Actions available on a demo screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    CreateOffer,
    AcceptOffer,
    SetAnswer,
    Retry,
    CopyDescription,
    /// Tic-tac-toe: play the cell under the cursor
    PlaceAtCursor,
    /// Tic-tac-toe: play a cell directly (0-8)
    Place(usize),
    MoveCursor(i8, i8),
    PlayAgain,
    /// Number transfer: edit the input field
    Digit(char),
    Backspace,
    /// Number transfer: add to the current value
    StepNumber(i64),
    SendNumber,
}

/// Which demo screen is reading keys; digits mean different things on each
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    TicTacToe,
    NumberTransfer,
}

/// Check a key press against a binding string ("Enter", "Esc", "Up", or a single character)
pub fn key_matches(binding: &str, code: KeyCode) -> bool {
    match (binding, code) {
        ("Enter", KeyCode::Enter) => true,
        ("Esc", KeyCode::Esc) => true,
        ("Up", KeyCode::Up) => true,
        ("Down", KeyCode::Down) => true,
        ("Left", KeyCode::Left) => true,
        ("Right", KeyCode::Right) => true,
        ("Backspace", KeyCode::Backspace) => true,
        (text, KeyCode::Char(c)) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(b), None) => b.eq_ignore_ascii_case(&c),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Map one key press to an action
pub fn map_key(key: KeyEvent, screen: Screen, bindings: &KeyBindings) -> Option<InputAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(InputAction::Quit);
    }

    // Screen-specific keys first so digits never collide with bindings
    match (screen, key.code) {
        (Screen::TicTacToe, KeyCode::Char(c @ '1'..='9')) => {
            return Some(InputAction::Place(c as usize - '1' as usize));
        }
        (Screen::TicTacToe, KeyCode::Up) => return Some(InputAction::MoveCursor(0, -1)),
        (Screen::TicTacToe, KeyCode::Down) => return Some(InputAction::MoveCursor(0, 1)),
        (Screen::TicTacToe, KeyCode::Left) => return Some(InputAction::MoveCursor(-1, 0)),
        (Screen::TicTacToe, KeyCode::Right) => return Some(InputAction::MoveCursor(1, 0)),
        (Screen::TicTacToe, KeyCode::Enter) | (Screen::TicTacToe, KeyCode::Char(' ')) => {
            return Some(InputAction::PlaceAtCursor);
        }
        (Screen::NumberTransfer, KeyCode::Char(c)) if c.is_ascii_digit() || c == '-' => {
            return Some(InputAction::Digit(c));
        }
        (Screen::NumberTransfer, KeyCode::Backspace) => return Some(InputAction::Backspace),
        (Screen::NumberTransfer, KeyCode::Up) => return Some(InputAction::StepNumber(1)),
        (Screen::NumberTransfer, KeyCode::Down) => return Some(InputAction::StepNumber(-1)),
        (Screen::NumberTransfer, KeyCode::Enter) => return Some(InputAction::SendNumber),
        _ => {}
    }

    let code = key.code;
    if key_matches(&bindings.quit, code) || code == KeyCode::Esc {
        Some(InputAction::Quit)
    } else if key_matches(&bindings.create_offer, code) {
        Some(InputAction::CreateOffer)
    } else if key_matches(&bindings.accept_offer, code) {
        Some(InputAction::AcceptOffer)
    } else if key_matches(&bindings.set_answer, code) {
        Some(InputAction::SetAnswer)
    } else if key_matches(&bindings.retry, code) {
        Some(InputAction::Retry)
    } else if key_matches(&bindings.copy_description, code) {
        Some(InputAction::CopyDescription)
    } else if screen == Screen::TicTacToe && key_matches(&bindings.play_again, code) {
        Some(InputAction::PlayAgain)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_matches_named_and_char_bindings() {
        assert!(key_matches("Enter", KeyCode::Enter));
        assert!(key_matches("O", KeyCode::Char('o')));
        assert!(key_matches("o", KeyCode::Char('O')));
        assert!(!key_matches("OA", KeyCode::Char('o')));
        assert!(!key_matches("Up", KeyCode::Down));
    }

    #[test]
    fn test_digits_place_on_board() {
        let bindings = KeyBindings::default();
        assert_eq!(
            map_key(press(KeyCode::Char('1')), Screen::TicTacToe, &bindings),
            Some(InputAction::Place(0))
        );
        assert_eq!(
            map_key(press(KeyCode::Char('9')), Screen::TicTacToe, &bindings),
            Some(InputAction::Place(8))
        );
    }

    #[test]
    fn test_digits_edit_number_input() {
        let bindings = KeyBindings::default();
        assert_eq!(
            map_key(press(KeyCode::Char('7')), Screen::NumberTransfer, &bindings),
            Some(InputAction::Digit('7'))
        );
        assert_eq!(
            map_key(press(KeyCode::Enter), Screen::NumberTransfer, &bindings),
            Some(InputAction::SendNumber)
        );
        assert_eq!(
            map_key(press(KeyCode::Down), Screen::NumberTransfer, &bindings),
            Some(InputAction::StepNumber(-1))
        );
    }

    #[test]
    fn test_bindings_from_config() {
        let bindings = KeyBindings::default();
        assert_eq!(
            map_key(press(KeyCode::Char('o')), Screen::TicTacToe, &bindings),
            Some(InputAction::CreateOffer)
        );
        assert_eq!(
            map_key(press(KeyCode::Char('r')), Screen::NumberTransfer, &bindings),
            Some(InputAction::Retry)
        );
        // Play again only exists in the game
        assert_eq!(
            map_key(press(KeyCode::Char('n')), Screen::NumberTransfer, &bindings),
            None
        );
    }
}
