// Menu state and demo selection

/// Application state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Demo(Demo),
    Exiting,
}

/// The two demos reachable from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    TicTacToe,
    NumberTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    TicTacToe,
    NumberTransfer,
    Quit,
}

impl MenuItem {
    pub fn display_text(&self) -> &'static str {
        match self {
            MenuItem::TicTacToe => "Tic-Tac-Toe",
            MenuItem::NumberTransfer => "Number Transfer",
            MenuItem::Quit => "Quit",
        }
    }

    pub fn all() -> Vec<MenuItem> {
        vec![MenuItem::TicTacToe, MenuItem::NumberTransfer, MenuItem::Quit]
    }
}

pub struct MenuState {
    pub selected_index: usize,
    pub items: Vec<MenuItem>,
}

impl MenuState {
    pub fn new() -> Self {
        Self {
            selected_index: 0,
            items: MenuItem::all(),
        }
    }

    pub fn selected_item(&self) -> MenuItem {
        self.items[self.selected_index]
    }

    /// Move selection up, wrapping to the bottom
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        } else {
            self.selected_index = self.items.len() - 1;
        }
    }

    /// Move selection down, wrapping to the top
    pub fn select_next(&mut self) {
        if self.selected_index < self.items.len() - 1 {
            self.selected_index += 1;
        } else {
            self.selected_index = 0;
        }
    }
}

impl Default for MenuState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        let mut menu = MenuState::new();
        assert_eq!(menu.selected_item(), MenuItem::TicTacToe);
        menu.select_previous();
        assert_eq!(menu.selected_item(), MenuItem::Quit);
        menu.select_next();
        assert_eq!(menu.selected_item(), MenuItem::TicTacToe);
        menu.select_next();
        assert_eq!(menu.selected_item(), MenuItem::NumberTransfer);
    }
}
