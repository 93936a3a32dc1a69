// Configuration module for p2ptoe
// Handles loading and managing configuration from TOML file

pub mod loader;
pub mod types;

pub use loader::{get_config_path, load_config, load_config_from};
pub use types::{Config, DisplayConfig, KeyBindings, NetworkConfig};
