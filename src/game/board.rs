// Tic-tac-toe board and rule engine
// Cells serialize as "X", "O" and "" to match the move frame on the wire

use serde::{Deserialize, Serialize};

pub const CELL_COUNT: usize = 9;

/// The 8 winning triples: rows, columns, diagonals
const WIN_PATTERNS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// X always moves first
    pub fn is_first_mover(self) -> bool {
        self == Mark::X
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

pub type Board = [Cell; CELL_COUNT];

/// Outcome of evaluating a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    None,
    Win(Mark),
    Draw,
}

impl GameResult {
    pub fn is_terminal(self) -> bool {
        self != GameResult::None
    }
}

/// Evaluate a board: a winning triple beats a full board
pub fn evaluate(board: &Board) -> GameResult {
    for [a, b, c] in WIN_PATTERNS {
        if let Some(mark) = board[a].mark() {
            if board[a] == board[b] && board[a] == board[c] {
                return GameResult::Win(mark);
            }
        }
    }

    if board.iter().all(|cell| *cell != Cell::Empty) {
        GameResult::Draw
    } else {
        GameResult::None
    }
}

pub fn empty_board() -> Board {
    [Cell::Empty; CELL_COUNT]
}

#[cfg(test)]
pub(crate) fn board_from(cells: [&str; CELL_COUNT]) -> Board {
    let mut board = empty_board();
    for (i, text) in cells.iter().enumerate() {
        board[i] = match *text {
            "X" => Cell::X,
            "O" => Cell::O,
            _ => Cell::Empty,
        };
    }
    board
}
