// p2ptoe configuration types
// Every section falls back to defaults so partial files stay valid

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub keybindings: KeyBindings,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyBindings {
    // Negotiation controls
    pub create_offer: String,
    pub accept_offer: String,
    pub set_answer: String,
    pub retry: String,
    pub copy_description: String,

    // Game controls
    pub play_again: String,
    pub quit: String,

    // Menu controls
    pub menu_up: String,
    pub menu_down: String,
    pub menu_select: String,
    pub menu_back: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            create_offer: "O".to_string(),
            accept_offer: "A".to_string(),
            set_answer: "S".to_string(),
            retry: "R".to_string(),
            copy_description: "C".to_string(),
            play_again: "N".to_string(),
            quit: "Q".to_string(),
            menu_up: "Up".to_string(),
            menu_down: "Down".to_string(),
            menu_select: "Enter".to_string(),
            menu_back: "Esc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    // UI refresh rate while waiting for keys and network events
    pub tick_ms: u64,

    // Mark colors (RGB values 0-255)
    pub x_color: [u8; 3],
    pub o_color: [u8; 3],

    // Highlight for the board cursor
    pub cursor_color: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            x_color: [0, 200, 255],   // Cyan
            o_color: [255, 170, 0],   // Orange
            cursor_color: [255, 255, 0], // Yellow
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    // STUN servers used to discover server-reflexive candidates (host:port)
    pub stun_servers: Vec<String>,

    // Upper bound on the wait for candidate gathering before a description is shown
    pub gathering_delay_ms: u64,

    // Data channel labels per demo
    pub game_channel_label: String,
    pub number_channel_label: String,

    // STUN query timeout per server
    pub stun_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun.l.google.com:19302".to_string(),
                "stun.cloudflare.com:3478".to_string(),
            ],
            gathering_delay_ms: 500,
            game_channel_label: "tictactoe".to_string(),
            number_channel_label: "numbers".to_string(),
            stun_timeout_secs: 3,
        }
    }
}
