// Centered overlay boxes: round results and the paste dialog

use ratatui::{
    layout::{Alignment, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// A message drawn on top of the current screen
#[derive(Debug, Clone)]
pub struct OverlayMessage {
    pub lines: Vec<String>,
    pub title: Option<String>,
    pub style: OverlayStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    Success,
    /// Text entry; the first line is the editable field
    Prompt,
}

impl OverlayMessage {
    fn styled(lines: Vec<String>, style: OverlayStyle) -> Self {
        Self {
            lines,
            title: None,
            style,
        }
    }

    pub fn success(lines: Vec<String>) -> Self {
        Self::styled(lines, OverlayStyle::Success)
    }

    pub fn prompt(lines: Vec<String>) -> Self {
        Self::styled(lines, OverlayStyle::Prompt)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn border_color(&self) -> Color {
        match self.style {
            OverlayStyle::Success => Color::Green,
            OverlayStyle::Prompt => Color::Yellow,
        }
    }

    fn text_color(&self) -> Color {
        match self.style {
            OverlayStyle::Prompt => Color::White,
            OverlayStyle::Success => Color::LightGreen,
        }
    }
}

/// Size of the box needed for a message, clamped to the available area
fn overlay_rect(message: &OverlayMessage, area: Rect) -> Rect {
    let longest = message
        .lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let width = (longest as u16).saturating_add(6).min(area.width.saturating_sub(4));
    let height = (message.lines.len() as u16)
        .saturating_add(4)
        .min(area.height.saturating_sub(2));

    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Render an overlay message in the center of `area`
pub fn render_overlay(frame: &mut Frame, message: &OverlayMessage, area: Rect) {
    let overlay_area = overlay_rect(message, area);
    frame.render_widget(Clear, overlay_area);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(message.border_color()))
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));
    if let Some(ref title) = message.title {
        block = block.title(format!(" {} ", title));
    }
    frame.render_widget(block, overlay_area);

    let text_style = Style::default().fg(message.text_color());
    let text_lines: Vec<Line> = message
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if message.style == OverlayStyle::Prompt && i == 0 {
                Line::from(Span::styled(
                    line.clone(),
                    text_style.add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(line.clone(), text_style))
            }
        })
        .collect();

    let alignment = match message.style {
        OverlayStyle::Prompt => Alignment::Left,
        OverlayStyle::Success => Alignment::Center,
    };
    let paragraph = Paragraph::new(text_lines)
        .alignment(alignment)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, overlay_area.inner(Margin::new(2, 1)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_rect_is_centered() {
        let message = OverlayMessage::success(vec!["YOU WIN!".to_string()]);
        let rect = overlay_rect(&message, Rect::new(0, 0, 80, 24));
        assert_eq!(rect.width, 14);
        assert_eq!(rect.height, 5);
        assert_eq!(rect.x, 33);
        assert_eq!(rect.y, 9);
    }

    #[test]
    fn test_overlay_rect_fits_small_terminal() {
        let message = OverlayMessage::prompt(vec!["x".repeat(200)]).with_title("Paste");
        let rect = overlay_rect(&message, Rect::new(0, 0, 40, 3));
        assert!(rect.width <= 36);
        assert!(rect.height <= 1);
    }
}
