use super::board::{empty_board, evaluate, Board, Cell, GameResult, Mark, CELL_COUNT};

/// Win/draw tally, reset whenever a new role is assigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Scores {
    fn record(&mut self, result: GameResult) {
        match result {
            GameResult::Win(Mark::X) => self.x_wins += 1,
            GameResult::Win(Mark::O) => self.o_wins += 1,
            GameResult::Draw => self.draws += 1,
            GameResult::None => {}
        }
    }
}

/// Why a local move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejected {
    #[error("not your turn")]
    NotYourTurn,
    #[error("cell is already taken")]
    CellOccupied,
    #[error("game is over, press N to play again")]
    GameOver,
    #[error("no such cell")]
    OutOfRange,
    #[error("waiting for a connection")]
    NoRole,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    /// Fixed when the offer is created (X) or accepted (O)
    pub local_mark: Option<Mark>,
    pub my_turn: bool,
    pub result: GameResult,
    pub scores: Scores,
    pub channel_ready: bool,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: empty_board(),
            local_mark: None,
            my_turn: false,
            result: GameResult::None,
            scores: Scores::default(),
            channel_ready: false,
        }
    }

    /// Assign the local identity for a new session; clears board and scores
    pub fn assign(&mut self, mark: Mark) {
        self.local_mark = Some(mark);
        self.board = empty_board();
        self.result = GameResult::None;
        self.scores = Scores::default();
        self.my_turn = false;
    }

    pub fn is_first_mover(&self) -> bool {
        self.local_mark.map(Mark::is_first_mover).unwrap_or(false)
    }

    pub fn channel_opened(&mut self) {
        self.channel_ready = true;
        if self.is_first_mover() {
            self.my_turn = true;
        }
    }

    /// Turn state is left as-is so a reopened channel resumes where it stopped
    pub fn channel_closed(&mut self) {
        self.channel_ready = false;
    }

    /// Apply a local move and give up the turn. Returns the board to send.
    pub fn try_local_move(&mut self, index: usize) -> Result<Board, MoveRejected> {
        let mark = self.local_mark.ok_or(MoveRejected::NoRole)?;
        if index >= CELL_COUNT {
            return Err(MoveRejected::OutOfRange);
        }
        if !self.my_turn {
            return Err(MoveRejected::NotYourTurn);
        }
        if self.board[index] != Cell::Empty {
            return Err(MoveRejected::CellOccupied);
        }
        if self.result.is_terminal() {
            return Err(MoveRejected::GameOver);
        }

        self.board[index] = mark.into();
        self.my_turn = false;
        self.refresh_result();
        Ok(self.board)
    }

    /// Whole-board overwrite from the peer's move frame
    pub fn apply_remote_move(&mut self, board: Board) {
        self.board = board;
        self.my_turn = true;
        self.refresh_result();
    }

    /// Clear the round. The first mover always starts, whoever asked for the reset.
    pub fn apply_reset(&mut self) {
        self.board = empty_board();
        self.result = GameResult::None;
        self.my_turn = self.is_first_mover();
        self.refresh_result();
    }

    /// Recompute the result; scores count only a fresh transition into a terminal result
    pub fn refresh_result(&mut self) {
        let result = evaluate(&self.board);
        if !self.result.is_terminal() && result.is_terminal() {
            self.scores.record(result);
        }
        self.result = result;
    }

    /// Result text from the local player's point of view
    pub fn result_text(&self) -> Option<String> {
        match self.result {
            GameResult::None => None,
            GameResult::Draw => Some("DRAW".to_string()),
            GameResult::Win(mark) if Some(mark) == self.local_mark => Some("YOU WIN!".to_string()),
            GameResult::Win(mark) => Some(format!("{} WINS", mark.as_str())),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
