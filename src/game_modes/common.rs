//! Shared demo-screen plumbing
//!
//! Both demos run the same loop: drain network events, finish the candidate wait,
//! draw, then read one terminal event. Negotiation keys, the paste dialog and the
//! clipboard are handled here; each demo only supplies its own actions and surface.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, layout::Rect, Frame, Terminal};
use tracing::{debug, info, warn};

use crate::config::{Config, DisplayConfig, KeyBindings};
use crate::game::{map_key, InputAction, Screen};
use crate::network::{
    self, Application, NegotiationProvider, SdpType, Session, SessionDescription,
};
use crate::ui::{self, OverlayMessage, ScreenChrome};

/// Which description the paste dialog is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteTarget {
    Offer,
    Answer,
}

impl From<PasteTarget> for SdpType {
    fn from(target: PasteTarget) -> Self {
        match target {
            PasteTarget::Offer => SdpType::Offer,
            PasteTarget::Answer => SdpType::Answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    Editing,
    Cancel,
    /// Ctrl+V: the caller reads the clipboard and feeds it back through `paste`
    ReadClipboard,
    Submit(PasteTarget, String),
}

/// Text box for a description copied from the other player
#[derive(Debug, Clone)]
pub struct PasteDialog {
    pub target: PasteTarget,
    pub buffer: String,
}

impl PasteDialog {
    pub fn new(target: PasteTarget) -> Self {
        Self {
            target,
            buffer: String::new(),
        }
    }

    /// Bracketed paste or clipboard contents
    pub fn paste(&mut self, text: &str) {
        self.buffer.push_str(text.trim_end_matches(&['\r', '\n'][..]));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PasteOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('v') | KeyCode::Char('V') => PasteOutcome::ReadClipboard,
                KeyCode::Char('c') => PasteOutcome::Cancel,
                KeyCode::Char('u') => {
                    self.buffer.clear();
                    PasteOutcome::Editing
                }
                _ => PasteOutcome::Editing,
            };
        }

        match key.code {
            KeyCode::Enter if !self.buffer.trim().is_empty() => {
                PasteOutcome::Submit(self.target, std::mem::take(&mut self.buffer))
            }
            KeyCode::Esc => PasteOutcome::Cancel,
            KeyCode::Backspace => {
                self.buffer.pop();
                PasteOutcome::Editing
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                PasteOutcome::Editing
            }
            _ => PasteOutcome::Editing,
        }
    }

    pub fn overlay(&self) -> OverlayMessage {
        let (title, what) = match self.target {
            PasteTarget::Offer => ("Accept offer", "offer"),
            PasteTarget::Answer => ("Set answer", "answer"),
        };

        // Descriptions run to kilobytes; show the tail so new input stays visible
        let count = self.buffer.chars().count();
        let preview = if self.buffer.is_empty() {
            format!("(paste the {} from the other player)", what)
        } else if count > 60 {
            let tail: String = self.buffer.chars().skip(count - 57).collect();
            format!("...{}", tail)
        } else {
            self.buffer.clone()
        };

        OverlayMessage::prompt(vec![
            preview,
            String::new(),
            format!("{} characters", count),
            "Enter: Confirm  Ctrl+V: Paste  Ctrl+U: Clear  Esc: Cancel".to_string(),
        ])
        .with_title(title)
    }
}

/// Negotiation UI state shared by both demos
#[derive(Default)]
pub struct NegotiationPanel {
    pub paste: Option<PasteDialog>,
    description: Option<SessionDescription>,
    labelled: Option<String>,
    pub feedback: Option<String>,
    // Held open so X11/Wayland keep serving the copied text
    clipboard: Option<arboard::Clipboard>,
}

impl NegotiationPanel {
    pub fn show_description(&mut self, description: SessionDescription) {
        match description.to_labelled_text() {
            Ok(text) => {
                info!(
                    kind = description.sdp_type.label(),
                    candidates = description.candidate_count(),
                    "description ready"
                );
                self.labelled = Some(text);
                self.description = Some(description);
                self.feedback = Some("Press C to copy it to the clipboard".to_string());
            }
            Err(e) => warn!(error = %e, "could not serialize description"),
        }
    }

    pub fn labelled_description(&self) -> Option<&str> {
        self.labelled.as_deref()
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, arboard::Error> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        Ok(self.clipboard.insert(clipboard))
    }

    /// Put the bare JSON description on the clipboard
    pub fn copy_description(&mut self) {
        let text = match self.description.as_ref().map(SessionDescription::to_text) {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                self.feedback = Some(format!("Copy failed: {}", e));
                return;
            }
            None => {
                self.feedback = Some("Nothing to copy yet".to_string());
                return;
            }
        };

        let result = self.clipboard().and_then(|clipboard| clipboard.set_text(text));
        self.feedback = Some(match result {
            Ok(()) => {
                debug!("description copied to clipboard");
                "Copied to clipboard!".to_string()
            }
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                format!("Clipboard unavailable: {}", e)
            }
        });
    }

    pub fn read_clipboard(&mut self) -> Result<String, arboard::Error> {
        self.clipboard()?.get_text()
    }
}

/// Handle the keys every demo shares. Returns false when the action belongs to the demo.
pub fn handle_negotiation_action<P: NegotiationProvider, A: Application>(
    session: &mut Session<P, A>,
    panel: &mut NegotiationPanel,
    action: &InputAction,
    now: Instant,
) -> bool {
    match action {
        InputAction::CreateOffer => {
            if let Err(e) = session.create_offer(now) {
                session.surface(e);
            }
        }
        InputAction::AcceptOffer => panel.paste = Some(PasteDialog::new(PasteTarget::Offer)),
        InputAction::SetAnswer => panel.paste = Some(PasteDialog::new(PasteTarget::Answer)),
        InputAction::Retry => match session.retry() {
            Ok(()) => panel.feedback = Some("Reopening data channel...".to_string()),
            Err(e) => session.surface(e),
        },
        InputAction::CopyDescription => panel.copy_description(),
        _ => return false,
    }
    true
}

/// Feed a submitted paste dialog into the session
pub fn submit_paste<P: NegotiationProvider, A: Application>(
    session: &mut Session<P, A>,
    target: PasteTarget,
    text: &str,
    now: Instant,
) {
    debug!(kind = ?SdpType::from(target), len = text.len(), "pasted description");
    let result = match target {
        PasteTarget::Offer => session.accept_offer(text, now),
        PasteTarget::Answer => session.apply_answer(text),
    };
    match result {
        Ok(()) => session.connection.clear_error(),
        Err(e) => session.surface(e),
    }
}

/// One demo: its application state, actions and surface
pub trait DemoScreen {
    type App: Application;

    const SCREEN: Screen;

    fn title(&self, app: &Self::App) -> String;

    fn handle_action<P: NegotiationProvider>(
        &mut self,
        session: &mut Session<P, Self::App>,
        action: InputAction,
    );

    fn hints(&self, bindings: &KeyBindings) -> Vec<(String, &'static str)>;

    fn render(&self, frame: &mut Frame, area: Rect, app: &Self::App, display: &DisplayConfig);
}

/// Key hints for the negotiation controls
pub fn negotiation_hints(bindings: &KeyBindings) -> Vec<(String, &'static str)> {
    vec![
        (bindings.create_offer.clone(), "Offer"),
        (bindings.accept_offer.clone(), "Accept"),
        (bindings.set_answer.clone(), "Answer"),
        (bindings.copy_description.clone(), "Copy"),
        (bindings.retry.clone(), "Retry"),
        (bindings.quit.clone(), "Menu"),
    ]
}

fn draw_demo<A: Application, D: DemoScreen<App = A>, P: NegotiationProvider>(
    frame: &mut Frame,
    screen: &D,
    session: &Session<P, A>,
    panel: &NegotiationPanel,
    config: &Config,
) {
    let title = screen.title(&session.app);
    let chrome = ScreenChrome {
        title: &title,
        status: session.connection.status(),
        error: session.connection.error(),
        description: panel.labelled_description(),
        feedback: panel.feedback.as_deref(),
        hints: screen.hints(&config.keybindings),
    };
    let surface = ui::render_chrome(frame, &chrome);
    screen.render(frame, surface, &session.app, &config.display);

    if let Some(ref dialog) = panel.paste {
        let area = frame.area();
        ui::render_overlay(frame, &dialog.overlay(), area);
    }
}

/// Run a demo until the user leaves it; the session is closed on the way out
pub fn run_demo<B: Backend, D: DemoScreen>(
    terminal: &mut Terminal<B>,
    config: &Config,
    label: &str,
    mut screen: D,
    app: D::App,
) -> Result<(), io::Error> {
    info!(%label, "demo started");
    let mut session = network::start_session(&config.network, label, app);
    let mut panel = NegotiationPanel::default();
    let tick = Duration::from_millis(config.display.tick_ms.max(1));

    loop {
        session.pump();
        if let Some(description) = session.tick(Instant::now()) {
            panel.show_description(description);
        }

        terminal.draw(|f| draw_demo(f, &screen, &session, &panel, config))?;

        if !event::poll(tick)? {
            continue;
        }

        match event::read()? {
            Event::Paste(text) => {
                if let Some(dialog) = panel.paste.as_mut() {
                    dialog.paste(&text);
                }
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(dialog) = panel.paste.as_mut() {
                    match dialog.handle_key(key) {
                        PasteOutcome::Editing => {}
                        PasteOutcome::Cancel => panel.paste = None,
                        PasteOutcome::ReadClipboard => match panel.read_clipboard() {
                            Ok(text) => {
                                if let Some(dialog) = panel.paste.as_mut() {
                                    dialog.paste(&text);
                                }
                            }
                            Err(e) => panel.feedback = Some(format!("Clipboard unavailable: {}", e)),
                        },
                        PasteOutcome::Submit(target, text) => {
                            panel.paste = None;
                            submit_paste(&mut session, target, &text, Instant::now());
                        }
                    }
                    continue;
                }

                let Some(action) = map_key(key, D::SCREEN, &config.keybindings) else {
                    continue;
                };
                panel.feedback = None;

                if action == InputAction::Quit {
                    session.close();
                    info!(%label, "demo closed");
                    return Ok(());
                }
                if !handle_negotiation_action(&mut session, &mut panel, &action, Instant::now()) {
                    screen.handle_action(&mut session, action);
                }
            }
            _ => {}
        }
    }
}
