// Debug logging for p2ptoe
// The TUI owns the terminal, so tracing output goes to a file and only with --debug

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::SystemTime;

use tracing::Level;

pub const LOG_FILE_PATH: &str = "/tmp/p2ptoe-debug.log";

/// Install the tracing subscriber
///
/// With `enabled = false` nothing is installed and every `tracing` macro is a no-op.
/// Otherwise the log file is truncated, a header is written and all events at DEBUG
/// and above are appended to it.
pub fn init(enabled: bool) -> io::Result<()> {
    if !enabled {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE_PATH)?;

    writeln!(file, "=== p2ptoe Debug Log ===")?;
    writeln!(file, "Session started: {:?}", SystemTime::now())?;
    writeln!(file, "To monitor: tail -f {}", LOG_FILE_PATH)?;
    writeln!(file, "========================================\n")?;

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    tracing::info!(path = LOG_FILE_PATH, "debug logging enabled");
    Ok(())
}
