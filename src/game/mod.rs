pub mod board;
pub mod input;
pub mod number;
pub mod state;

pub use board::{Board, Cell, Mark};
pub use input::{map_key, InputAction, Screen};
pub use number::NumberState;
pub use state::{GameState, MoveRejected};
