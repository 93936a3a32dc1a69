// Main menu: pick a demo or quit

pub mod input;
pub mod render;
pub mod state;

pub use input::{handle_menu_input, MenuAction};
pub use render::render_menu;
pub use state::{AppState, Demo, MenuState};
