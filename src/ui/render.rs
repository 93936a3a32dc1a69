use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::config::DisplayConfig;
use crate::game::{Cell, GameState, Mark, NumberState};

// Layout of a demo screen, top to bottom:
// title bar, status + error lines, demo surface, description box, key hints
const STATUS_ROWS: u16 = 3;
const DESCRIPTION_ROWS: u16 = 8;
const HINT_ROWS: u16 = 1;

/// Width of one board cell in columns
const CELL_WIDTH: usize = 5;

/// Everything a demo screen shows around its own surface
pub struct ScreenChrome<'a> {
    pub title: &'a str,
    pub status: String,
    pub error: Option<&'a str>,
    /// Labelled description ready to hand to the other player
    pub description: Option<&'a str>,
    /// Short-lived note such as "Copied to clipboard"
    pub feedback: Option<&'a str>,
    /// (key, action) pairs for the bottom line
    pub hints: Vec<(String, &'static str)>,
}

pub fn rgb(color: [u8; 3]) -> Color {
    Color::Rgb(color[0], color[1], color[2])
}

fn hint_line(hints: &[(String, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(key.clone(), Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            format!(": {}  ", action),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Draw the frame shared by both demos and return the area left for the demo surface
pub fn render_chrome(frame: &mut Frame, chrome: &ScreenChrome) -> Rect {
    let area = frame.area();

    let bg = Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0)));
    frame.render_widget(bg, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", chrome.title));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_ROWS),
            Constraint::Min(5),
            Constraint::Length(DESCRIPTION_ROWS),
            Constraint::Length(HINT_ROWS),
        ])
        .split(inner);

    // Status, error and feedback
    let mut status_lines = vec![Line::from(Span::styled(
        chrome.status.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];
    if let Some(error) = chrome.error {
        status_lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::LightRed),
        )));
    }
    if let Some(feedback) = chrome.feedback {
        status_lines.push(Line::from(Span::styled(
            feedback.to_string(),
            Style::default().fg(Color::LightGreen),
        )));
    }
    frame.render_widget(
        Paragraph::new(status_lines).wrap(Wrap { trim: true }),
        chunks[0],
    );

    render_description(frame, chunks[2], chrome.description);

    frame.render_widget(
        Paragraph::new(hint_line(&chrome.hints)).alignment(Alignment::Center),
        chunks[3],
    );

    chunks[1]
}

fn render_description(frame: &mut Frame, area: Rect, description: Option<&str>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Local description ");

    let body = match description {
        Some(text) => Paragraph::new(text.to_string()).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new("(none yet)").style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(body.block(block).wrap(Wrap { trim: false }), area);
}

fn cell_span(cell: Cell, selected: bool, display: &DisplayConfig) -> Span<'static> {
    let (text, mut style) = match cell.mark() {
        Some(Mark::X) => ("X", Style::default().fg(rgb(display.x_color))),
        Some(Mark::O) => ("O", Style::default().fg(rgb(display.o_color))),
        None => (" ", Style::default()),
    };
    style = style.add_modifier(Modifier::BOLD);
    if selected {
        style = style.bg(rgb(display.cursor_color)).fg(Color::Black);
    }
    Span::styled(format!("{:^width$}", text, width = CELL_WIDTH), style)
}

/// Text lines of the 3x3 grid with the cursor cell highlighted
fn board_lines(state: &GameState, cursor: usize, display: &DisplayConfig) -> Vec<Line<'static>> {
    let separator = vec!["─".repeat(CELL_WIDTH); 3].join("┼");
    let grid_style = Style::default().fg(Color::DarkGray);

    let mut lines = Vec::with_capacity(5);
    for row in 0..3 {
        if row > 0 {
            lines.push(Line::from(Span::styled(separator.clone(), grid_style)));
        }
        let mut spans = Vec::with_capacity(5);
        for col in 0..3 {
            if col > 0 {
                spans.push(Span::styled("│", grid_style));
            }
            let index = row * 3 + col;
            spans.push(cell_span(state.board[index], index == cursor, display));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn turn_text(state: &GameState) -> String {
    match state.local_mark {
        None => "Create or accept an offer to get a mark".to_string(),
        Some(_) if state.result.is_terminal() => "Round over".to_string(),
        Some(_) if !state.channel_ready => "Waiting for the data channel".to_string(),
        Some(_) if state.my_turn => "Your turn".to_string(),
        Some(_) => "Opponent's turn".to_string(),
    }
}

pub fn render_board(
    frame: &mut Frame,
    area: Rect,
    state: &GameState,
    cursor: usize,
    display: &DisplayConfig,
) {
    let mut lines = board_lines(state, cursor, display);
    lines.push(Line::from(""));

    let you = state.local_mark.map(Mark::as_str).unwrap_or("-");
    lines.push(Line::from(vec![
        Span::styled("You: ", Style::default().fg(Color::Gray)),
        Span::styled(you, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("   {}", turn_text(state)),
            Style::default().fg(Color::Gray),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        format!(
            "X wins {}   O wins {}   Draws {}",
            state.scores.x_wins, state.scores.o_wins, state.scores.draws
        ),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

pub fn render_number(frame: &mut Frame, area: Rect, state: &NumberState) {
    let received = state
        .received_value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "nothing yet".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Your number: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}_", state.input),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("(sends {})", state.local_value),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Received: ", Style::default().fg(Color::Gray)),
            Span::styled(
                received,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::board_from;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_board_lines_layout() {
        let mut state = GameState::new();
        state.board = board_from(["X", "", "", "", "O", "", "", "", ""]);
        let lines = board_lines(&state, 8, &DisplayConfig::default());

        assert_eq!(lines.len(), 5);
        assert_eq!(line_text(&lines[0]), "  X  │     │     ");
        assert_eq!(line_text(&lines[1]), "─────┼─────┼─────");
        assert_eq!(line_text(&lines[2]), "     │  O  │     ");
    }

    #[test]
    fn test_cursor_cell_is_highlighted() {
        let state = GameState::new();
        let display = DisplayConfig::default();
        let lines = board_lines(&state, 4, &display);
        // Middle row: cell, bar, cell, bar, cell
        let middle = &lines[2].spans[2];
        assert_eq!(middle.style.bg, Some(rgb(display.cursor_color)));
        assert_eq!(lines[0].spans[0].style.bg, None);
    }

    #[test]
    fn test_turn_text() {
        let mut state = GameState::new();
        assert!(turn_text(&state).contains("offer"));
        state.assign(Mark::X);
        assert_eq!(turn_text(&state), "Waiting for the data channel");
        state.channel_opened();
        assert_eq!(turn_text(&state), "Your turn");
    }
}
