// Menu rendering with Ratatui

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use super::state::MenuState;

const TITLE_ART: [&str; 5] = [
    " ___  ___  ___   _____  ___  ___ ",
    "| _ \\|_  )| _ \\ |_   _|/ _ \\| __|",
    "|  _/ / / |  _/   | | | (_) | _| ",
    "|_|  /___||_|     |_|  \\___/|___|",
    "   tic-tac-toe over WebRTC     ",
];

pub fn render_menu(frame: &mut Frame, menu_state: &MenuState) {
    let area = frame.area();

    let bg = Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0)));
    frame.render_widget(bg, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Title
            Constraint::Min(5),    // Items
            Constraint::Length(3), // Controls hint
        ])
        .split(area);

    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut title_text = vec![Line::from("")];
    title_text.extend(
        TITLE_ART
            .iter()
            .map(|row| Line::from(Span::styled(*row, title_style))),
    );
    frame.render_widget(
        Paragraph::new(title_text).alignment(Alignment::Center),
        chunks[0],
    );

    let menu_items: Vec<Line> = menu_state
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let is_selected = i == menu_state.selected_index;
            let prefix = if is_selected { "  > " } else { "    " };
            let text = format!("{}{}", prefix, item.display_text());

            let style = if is_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(text, style))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(menu_items).alignment(Alignment::Center),
        chunks[1],
    );

    let controls = Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Gray)),
        Span::styled(": Navigate  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Enter", Style::default().fg(Color::Gray)),
        Span::styled(": Select  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Q/Esc", Style::default().fg(Color::Gray)),
        Span::styled(": Quit", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center),
        chunks[2],
    );
}
