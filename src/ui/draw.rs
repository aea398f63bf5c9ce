// ui/draw.rs

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use super::constants::TITLE;

pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;

pub fn center_rect(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
    let [area] = Layout::horizontal([horizontal])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
    area
}

/// True (and a warning drawn) when the terminal cannot fit a screen.
pub fn too_small(area: Rect, buffer: &mut Buffer) -> bool {
    if area.width >= MIN_WIDTH && area.height >= MIN_HEIGHT {
        return false;
    }
    Paragraph::new("Terminal too small. Please resize.")
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center)
        .render(area, buffer);
    true
}

pub fn render_header(buffer: &mut Buffer, area: Rect, subtitle: &str) {
    let header = Paragraph::new(format!("Mettle v{} · {}", env!("CARGO_PKG_VERSION"), subtitle))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().border_type(BorderType::Rounded))
        .alignment(Alignment::Center);
    header.render(area, buffer);
}

pub fn render_title(buffer: &mut Buffer, area: Rect) {
    let title_area = center_rect(area, Constraint::Length(32), Constraint::Length(7));
    Paragraph::new(TITLE)
        .alignment(Alignment::Left)
        .style(Style::default().fg(Color::Yellow))
        .render(title_area, buffer);
}

// Status line: the latest message if there is one, otherwise the key hints.
pub fn render_status(buffer: &mut Buffer, area: Rect, status: Option<&str>, keys: &str) {
    let (text, color) = match status {
        Some(message) => (message, Color::Yellow),
        None => (keys, Color::DarkGray),
    };
    Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::NONE))
        .alignment(Alignment::Center)
        .render(area, buffer);
}

pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
}
