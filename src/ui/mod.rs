pub mod overlay;
pub mod render;

pub use overlay::{render_overlay, OverlayMessage};
pub use render::{render_board, render_chrome, render_number, ScreenChrome};
