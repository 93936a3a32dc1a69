mod common;
mod number;
mod tictactoe;

pub use number::run_number_transfer;
pub use tictactoe::run_tictactoe;
