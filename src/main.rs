mod config;
mod debug;
mod game;
mod game_modes;
mod menu;
mod network;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use config::Config;
use menu::{AppState, Demo, MenuAction, MenuState};

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct Args {
    debug: bool,
    config_path: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" | "-d" => parsed.debug = true,
            "--config" | "-c" => {
                let path = iter.next().context("--config requires a path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => parsed.help = true,
            other => bail!("unknown argument: {}", other),
        }
    }

    Ok(parsed)
}

fn print_usage(program: &str) {
    println!("p2ptoe - peer-to-peer tic-tac-toe over a WebRTC data channel");
    println!();
    println!("Usage:");
    println!("  {} [--debug] [--config <path>]", program);
    println!();
    println!("Options:");
    println!("  -d, --debug          Write a debug log to {}", debug::LOG_FILE_PATH);
    println!("  -c, --config <path>  Read configuration from <path>");
    println!("  -h, --help           Show this help");
    println!();
    println!("Default config: {}", config::get_config_path().display());
    println!();
    println!("No signaling server is used: one player creates an offer (O), copies it (C)");
    println!("and sends it by any chat; the other accepts it (A) and sends the answer back,");
    println!("which the first player sets (S).");
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("p2ptoe");

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(program);
            std::process::exit(1);
        }
    };
    if options.help {
        print_usage(program);
        return Ok(());
    }

    debug::init(options.debug).context("failed to initialize debug log")?;

    let config = match options.config_path {
        Some(ref path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("failed to load configuration")?;
    info!(?config, "configuration loaded");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config);

    // Restore the terminal even when the app failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result?;
    info!("session ended");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
) -> Result<(), io::Error> {
    let mut app_state = AppState::Menu;
    let mut menu_state = MenuState::new();
    let tick = Duration::from_millis(config.display.tick_ms.max(1));

    loop {
        match app_state {
            AppState::Menu => {
                terminal.draw(|f| menu::render_menu(f, &menu_state))?;

                match menu::handle_menu_input(&mut menu_state, &config.keybindings, tick)? {
                    MenuAction::None => {}
                    MenuAction::Start(demo) => app_state = AppState::Demo(demo),
                    MenuAction::Quit => app_state = AppState::Exiting,
                }
            }
            AppState::Demo(demo) => {
                info!(?demo, "entering demo");
                match demo {
                    Demo::TicTacToe => game_modes::run_tictactoe(terminal, config)?,
                    Demo::NumberTransfer => game_modes::run_number_transfer(terminal, config)?,
                }
                app_state = AppState::Menu;
            }
            AppState::Exiting => return Ok(()),
        }
    }
}
