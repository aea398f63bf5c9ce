// ui/import_menu.rs

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{List, ListItem, Paragraph, StatefulWidget, Widget},
};

use super::{
    Component, ComponentEnum, Roster,
    constants::IMPORT_KEYS,
    draw::{panel, render_header, render_status, too_small},
    widgets::StatefulList,
};
use crate::{app::Action, context::Context};

// Lists the JSON files waiting in the exports folder.
#[derive(Debug)]
pub struct ImportMenu {
    folder: PathBuf,
    files: StatefulList<PathBuf>,
}

impl ImportMenu {
    pub fn new(folder: PathBuf, files: Vec<PathBuf>) -> Self {
        ImportMenu {
            folder,
            files: StatefulList::with_items(files),
        }
    }
}

impl Component for ImportMenu {
    fn on_key(&mut self, key: KeyEvent, _context: &Context) -> Option<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => {
                Some(Action::SwitchComponent(ComponentEnum::from(Roster::new())))
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.files.previous();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.files.next();
                None
            }
            KeyCode::Enter | KeyCode::Char('l') => {
                self.files.selected().cloned().map(Action::ImportFile)
            }
            _ => None,
        }
    }

    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context) {
        if too_small(area, buffer) {
            return;
        }
        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);
        render_header(buffer, header, "Import");

        let block = panel(" Exported heroes ");
        if self.files.items.is_empty() {
            Paragraph::new(format!(
                "No .json files found in {}",
                self.folder.display()
            ))
            .style(Style::default().fg(Color::Yellow))
            .block(block)
            .render(body, buffer);
        } else {
            let items: Vec<ListItem> = self
                .files
                .items
                .iter()
                .map(|path| {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_default();
                    ListItem::new(name)
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().fg(Color::Yellow))
                .highlight_symbol("> ");
            let mut state = self.files.state.clone();
            StatefulWidget::render(list, body, buffer, &mut state);
        }

        render_status(buffer, status, context.status, IMPORT_KEYS);
    }
}
